//! Regex parsers for package names and match-context lines.

use std::sync::LazyLock;

use dropwatch_core::item::MatchContext;
use regex::Regex;

/// `<event> <year> <location> Souvenir Package`, anchored at both ends.
///
/// The event is matched lazily so the first standalone four-digit token is
/// taken as the year.
static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"^(?P<event>.+?) (?P<year>\d{4}) (?P<location>.+) Souvenir Package$",
  )
  .expect("package name pattern is valid")
});

static MATCH_CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"It was dropped during the (?P<tier>.+?) match between (?P<team1>.+?) and (?P<team2>.+?),",
  )
  .expect("match context pattern is valid")
});

/// The structured pieces of a souvenir package name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageName {
  pub event:    String,
  pub year:     u16,
  pub location: String,
}

/// Parse a display name of the form
/// `"<event> <4-digit year> <location> Souvenir Package"`.
///
/// The match must reach the end of the name: trailing text after
/// `Souvenir Package` means no match.
pub fn parse_package_name(name: &str) -> Option<PackageName> {
  let caps = PACKAGE_NAME.captures(name.trim())?;
  Some(PackageName {
    event:    caps["event"].to_string(),
    year:     caps["year"].parse().ok()?,
    location: caps["location"].to_string(),
  })
}

/// Return the match context from the first line that carries one.
pub fn parse_match_context<S: AsRef<str>>(lines: &[S]) -> Option<MatchContext> {
  lines.iter().find_map(|line| {
    let caps = MATCH_CONTEXT.captures(line.as_ref())?;
    Some(MatchContext {
      tier:  caps["tier"].to_string(),
      team1: caps["team1"].to_string(),
      team2: caps["team2"].to_string(),
    })
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  // ── Package names ──────────────────────────────────────────────────────────

  #[test]
  fn splits_event_year_location() {
    let p = parse_package_name("ESL One Katowice 2019 Dust II Souvenir Package")
      .unwrap();
    assert_eq!(p.event, "ESL One Katowice");
    assert_eq!(p.year, 2019);
    assert_eq!(p.location, "Dust II");
  }

  #[test]
  fn first_four_digit_token_is_the_year() {
    let p = parse_package_name("PGL Major Stockholm 2021 Cache 2000 Souvenir Package")
      .unwrap();
    assert_eq!(p.event, "PGL Major Stockholm");
    assert_eq!(p.year, 2021);
    assert_eq!(p.location, "Cache 2000");
  }

  #[test]
  fn trailing_text_does_not_match() {
    assert!(
      parse_package_name("ESL One Katowice 2019 Dust II Souvenir Package (Opened)")
        .is_none()
    );
  }

  #[test]
  fn missing_anchor_does_not_match() {
    assert!(parse_package_name("ESL One Katowice 2019 Dust II").is_none());
    assert!(parse_package_name("ESL One Katowice 2019 Dust II Package").is_none());
  }

  #[test]
  fn missing_year_does_not_match() {
    assert!(parse_package_name("ESL One Katowice Dust II Souvenir Package").is_none());
    assert!(parse_package_name("ESL One 19 Dust II Souvenir Package").is_none());
  }

  #[test]
  fn missing_location_does_not_match() {
    assert!(parse_package_name("ESL One Katowice 2019 Souvenir Package").is_none());
  }

  // ── Match context ──────────────────────────────────────────────────────────

  #[test]
  fn first_matching_line_wins() {
    let lines = [
      "Nothing here.",
      "It was dropped during the Quarterfinal match between NaVi and G2, in which NaVi won.",
      "It was dropped during the Final match between FaZe and Vitality, in which FaZe won.",
    ];
    let ctx = parse_match_context(&lines).unwrap();
    assert_eq!(ctx.tier, "Quarterfinal");
    assert_eq!(ctx.team1, "NaVi");
    assert_eq!(ctx.team2, "G2");
  }

  #[test]
  fn line_without_trailing_comma_is_ignored() {
    let lines = ["It was dropped during the Final match between FaZe and Vitality"];
    assert!(parse_match_context(&lines).is_none());
  }

  #[test]
  fn no_lines_no_context() {
    let lines: [&str; 0] = [];
    assert!(parse_match_context(&lines).is_none());
  }
}
