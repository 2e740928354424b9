use strsim::levenshtein;

/// Closest package names to `needle`, best first, at most three. Package names
/// are short, so the distance budget grows slowly with length.
pub fn closest_packages(needle: &str, candidates: impl IntoIterator<Item = String>) -> Vec<String> {
    let budget = match needle.len() {
        0 => return vec![],
        1..=4 => 1,
        5..=8 => 2,
        _ => 3,
    };
    let mut scored: Vec<(usize, String)> = candidates
        .into_iter()
        .filter(|c| c != needle)
        .filter_map(|c| {
            let d = levenshtein(needle, &c);
            (d <= budget).then_some((d, c))
        })
        .collect();
    scored.sort();
    scored.dedup_by(|a, b| a.1 == b.1);
    scored.into_iter().take(3).map(|(_, name)| name).collect()
}

pub fn did_you_mean(needle: &str, candidates: impl IntoIterator<Item = String>) -> Option<String> {
    let names = closest_packages(needle, candidates);
    match names.as_slice() {
        [] => None,
        [one] => Some(format!("did you mean `{one}`?")),
        many => Some(format!(
            "did you mean one of: {}?",
            many.iter()
                .map(|s| format!("`{s}`"))
                .collect::<Vec<_>>()
                .join(", ")
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{closest_packages, did_you_mean};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn typo_suggests_the_real_package() {
        assert_eq!(
            did_you_mean("stirngs", names(&["strings", "strconv", "sort"])),
            Some("did you mean `strings`?".to_string())
        );
    }

    #[test]
    fn far_names_are_not_suggested() {
        assert_eq!(did_you_mean("yaml", names(&["strings", "bytes"])), None);
        assert!(closest_packages("", names(&["os"])).is_empty());
    }

    #[test]
    fn several_matches_are_listed_closest_first() {
        let got = closest_packages("byte", names(&["bytes", "bytes", "byte", "bite", "zzzz"]));
        assert_eq!(got, vec!["bite", "bytes"]);
    }
}
