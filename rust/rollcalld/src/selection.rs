use crate::model::ActiveSession;

/// Picks the subject the dashboard shows.
///
/// Order: keep `current` if still listed, else the active session's subject if
/// listed, else the first subject. `None` when no subjects exist. Pure, so it is
/// safe to rerun on every `subjects` or `activeSession` push in any order.
pub fn resolve_selection(
    current: Option<&str>,
    subjects: &[String],
    active: Option<&ActiveSession>,
) -> Option<String> {
    let listed = |s: &str| subjects.iter().any(|x| x == s);

    if let Some(current) = current.filter(|s| listed(s)) {
        return Some(current.to_string());
    }
    if let Some(subject) = active
        .and_then(|a| a.subject.as_deref())
        .filter(|s| listed(s))
    {
        return Some(subject.to_string());
    }
    subjects.first().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subjects(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn active(subject: &str) -> ActiveSession {
        ActiveSession {
            subject: Some(subject.to_string()),
            date: Some("2026-10-18".to_string()),
        }
    }

    #[test]
    fn keeps_listed_selection() {
        let s = subjects(&["Math", "Art"]);
        assert_eq!(
            resolve_selection(Some("Math"), &s, Some(&active("Art"))).as_deref(),
            Some("Math")
        );
    }

    #[test]
    fn falls_back_to_active_subject() {
        let s = subjects(&["Math", "Art"]);
        assert_eq!(resolve_selection(None, &s, Some(&active("Art"))).as_deref(), Some("Art"));
        assert_eq!(
            resolve_selection(Some("Music"), &s, Some(&active("Art"))).as_deref(),
            Some("Art")
        );
    }

    #[test]
    fn falls_back_to_first_subject() {
        let s = subjects(&["Math", "Art"]);
        assert_eq!(
            resolve_selection(Some("Music"), &s, Some(&active("Drama"))).as_deref(),
            Some("Math")
        );
        assert_eq!(resolve_selection(None, &s, None).as_deref(), Some("Math"));
    }

    #[test]
    fn empty_subject_list_clears_selection() {
        assert_eq!(resolve_selection(Some("Math"), &[], Some(&active("Math"))), None);
    }

    #[test]
    fn resolution_is_idempotent() {
        let s = subjects(&["Math", "Art", "Music"]);
        let a = active("Music");
        for current in [None, Some("Art"), Some("Gone")] {
            let once = resolve_selection(current, &s, Some(&a));
            let twice = resolve_selection(once.as_deref(), &s, Some(&a));
            assert_eq!(once, twice);
        }
    }
}
