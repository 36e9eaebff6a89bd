// Club name mappings and name normalization for matching schedule entries
// against statistics records.

/// Full club name to standard abbreviation.
const TEAM_ABBREVIATIONS: &[(&str, &str)] = &[
    ("Arizona Diamondbacks", "ARI"),
    ("Atlanta Braves", "ATL"),
    ("Baltimore Orioles", "BAL"),
    ("Boston Red Sox", "BOS"),
    ("Chicago Cubs", "CHC"),
    ("Chicago White Sox", "CHW"),
    ("Cincinnati Reds", "CIN"),
    ("Cleveland Guardians", "CLE"),
    ("Colorado Rockies", "COL"),
    ("Detroit Tigers", "DET"),
    ("Houston Astros", "HOU"),
    ("Kansas City Royals", "KCR"),
    ("Los Angeles Angels", "LAA"),
    ("Los Angeles Dodgers", "LAD"),
    ("Miami Marlins", "MIA"),
    ("Milwaukee Brewers", "MIL"),
    ("Minnesota Twins", "MIN"),
    ("New York Mets", "NYM"),
    ("New York Yankees", "NYY"),
    ("Oakland Athletics", "ATH"),
    ("Athletics", "ATH"),
    ("Philadelphia Phillies", "PHI"),
    ("Pittsburgh Pirates", "PIT"),
    ("San Diego Padres", "SDP"),
    ("San Francisco Giants", "SFG"),
    ("Seattle Mariners", "SEA"),
    ("St. Louis Cardinals", "STL"),
    ("Tampa Bay Rays", "TBR"),
    ("Texas Rangers", "TEX"),
    ("Toronto Blue Jays", "TOR"),
    ("Washington Nationals", "WSN"),
];

/// Alternate abbreviations used by payroll and schedule sources.
const ABBREVIATION_ALIASES: &[(&str, &str)] = &[
    ("AZ", "ARI"),
    ("CWS", "CHW"),
    ("KC", "KCR"),
    ("OAK", "ATH"),
    ("SD", "SDP"),
    ("SF", "SFG"),
    ("TB", "TBR"),
    ("WSH", "WSN"),
    ("WAS", "WSN"),
];

/// Standard abbreviation for a full club name or an alternate abbreviation.
pub fn abbreviation_for(team: &str) -> Option<&'static str> {
    let team = team.trim();
    TEAM_ABBREVIATIONS
        .iter()
        .chain(ABBREVIATION_ALIASES)
        .find(|(name, _)| name.eq_ignore_ascii_case(team))
        .map(|(_, abbr)| *abbr)
}

const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv"];

/// Matching key for a person's name: lowercase ASCII, accents folded,
/// punctuation removed, generational suffix dropped.
pub fn normalize_person_name(name: &str) -> String {
    let folded: String = name
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    let mut words: Vec<&str> = folded.split_whitespace().collect();
    if words.len() > 1 && words.last().is_some_and(|w| NAME_SUFFIXES.contains(w)) {
        words.pop();
    }
    words.join(" ")
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_names_map_to_abbreviations() {
        assert_eq!(abbreviation_for("Boston Red Sox"), Some("BOS"));
        assert_eq!(abbreviation_for("  new york mets "), Some("NYM"));
        assert_eq!(abbreviation_for("Athletics"), Some("ATH"));
        assert_eq!(abbreviation_for("Gotham Knights"), None);
    }

    #[test]
    fn aliases_map_to_standard_abbreviations() {
        assert_eq!(abbreviation_for("TB"), Some("TBR"));
        assert_eq!(abbreviation_for("CWS"), Some("CHW"));
        assert_eq!(abbreviation_for("BOS"), None);
    }

    #[test]
    fn normalize_strips_accents_punctuation_and_suffix() {
        assert_eq!(normalize_person_name("José Berríos"), "jose berrios");
        assert_eq!(normalize_person_name("Luis García Jr."), "luis garcia");
        assert_eq!(normalize_person_name("Michael King"), "michael king");
        assert_eq!(normalize_person_name("A.J. Puk"), "a j puk");
        assert_eq!(normalize_person_name("  Zack   Wheeler "), "zack wheeler");
    }

    #[test]
    fn lone_suffix_word_is_kept() {
        assert_eq!(normalize_person_name("Jr"), "jr");
    }
}
