/// Derives the stable storage id for a student from their display name and
/// class label. Lowercases both, collapses whitespace runs in the name to
/// single underscores, and joins them with an underscore.
///
/// "Jan Jansen" + "3A" becomes "jan_jansen_3a". The same inputs must always
/// produce the same id, since it is the storage key for the student record.
pub fn student_id(name: &str, class: &str) -> String {
    let name = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    format!("{}_{}", name, class.trim().to_lowercase())
}
