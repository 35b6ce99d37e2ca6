//! Course and lesson data returned by the catalog API.

/// A course and its ordered lessons. Immutable after fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    /// Course title, used as the destination directory name.
    pub title: String,
    /// Lessons ordered by index (ties broken by hash).
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Creates a course, ordering lessons by display index.
    #[must_use]
    pub fn new(title: impl Into<String>, mut lessons: Vec<Lesson>) -> Self {
        lessons.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.hash.cmp(&b.hash)));
        Self {
            title: title.into(),
            lessons,
        }
    }
}

/// One video unit of a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    /// Opaque API identifier.
    pub hash: String,
    /// Human-readable lesson title.
    pub title: String,
    /// Ordering/display position.
    pub index: u32,
}

impl Lesson {
    /// Creates a lesson.
    #[must_use]
    pub fn new(hash: impl Into<String>, title: impl Into<String>, index: u32) -> Self {
        Self {
            hash: hash.into(),
            title: title.into(),
            index,
        }
    }

    /// Short label used in logs and task reports, e.g. `3 "Closures"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} \"{}\"", self.index, self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_orders_lessons_by_index() {
        let course = Course::new(
            "Rust",
            vec![
                Lesson::new("c", "Third", 2),
                Lesson::new("a", "First", 0),
                Lesson::new("b", "Second", 1),
            ],
        );
        let titles: Vec<&str> = course.lessons.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, ["First", "Second", "Third"]);
    }

    #[test]
    fn test_course_breaks_index_ties_by_hash() {
        let course = Course::new(
            "Rust",
            vec![Lesson::new("zz", "B", 1), Lesson::new("aa", "A", 1)],
        );
        assert_eq!(course.lessons[0].hash, "aa");
    }

    #[test]
    fn test_lesson_label() {
        assert_eq!(Lesson::new("h", "Closures", 3).label(), "3 \"Closures\"");
    }
}
