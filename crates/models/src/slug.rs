/// The canonical identifier normalization. Every STAC id and every storage
/// path segment in the tree is produced by this one function, so that a
/// mission named `MARS GLOBAL SURVEYOR` and a PDS3 `MISSION_NAME` of
/// `"Mars Global Surveyor"` land on the same node.
///
/// Lowercases ASCII alphanumerics and collapses every other run of
/// characters into a single `-`. Leading and trailing separators are
/// dropped.
pub fn slug(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_sep = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn slugs_are_lowercase_dashed() {
        assert_eq!("mars-global-surveyor", slug("MARS GLOBAL SURVEYOR"));
        assert_eq!("mgs-m-mola-3-pedr-l1a-v1-0", slug("MGS-M-MOLA-3-PEDR-L1A-V1.0"));
        assert_eq!("mola", slug("MOLA"));
    }

    #[test]
    fn separator_runs_collapse() {
        assert_eq!("a-b", slug("a  / _ b"));
        assert_eq!("a-b", slug("--a--b--"));
        assert_eq!("", slug("///"));
    }

    #[test]
    fn slug_is_idempotent() {
        for input in ["MARS GLOBAL SURVEYOR", "MGS-M-MOLA-3-PEDR-L1A-V1.0", "Viking Orbiter 1"] {
            let once = slug(input);
            assert_eq!(once, slug(&once));
        }
    }
}
