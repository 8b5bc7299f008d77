use chrono::NaiveTime;

/// Ordering key for the free-text `requested_time` of an order.
///
/// Values that read as a clock time sort numerically and come first; anything
/// else sorts after them by its raw text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum RequestedTimeKey {
    Clock(NaiveTime),
    Text(String),
}

pub fn requested_time_key(raw: &str) -> RequestedTimeKey {
    match parse_clock(raw) {
        Some(time) => RequestedTimeKey::Clock(time),
        None => RequestedTimeKey::Text(raw.to_string()),
    }
}

/// Parses `H:MM`, `HH:MM` or `HH:MM:SS`.
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let mut parts = raw.trim().split(':');

    let hours = digits(parts.next()?, 1..=2)?;
    let minutes = digits(parts.next()?, 2..=2)?;
    let seconds = match parts.next() {
        Some(part) => digits(part, 2..=2)?,
        None => 0,
    };

    if parts.next().is_some() {
        return None;
    }

    NaiveTime::from_hms_opt(hours, minutes, seconds)
}

fn digits(part: &str, len: std::ops::RangeInclusive<usize>) -> Option<u32> {
    if !len.contains(&part.len()) || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_variants() {
        assert_eq!(parse_clock("6:44"), NaiveTime::from_hms_opt(6, 44, 0));
        assert_eq!(parse_clock(" 15:06 "), NaiveTime::from_hms_opt(15, 6, 0));
        assert_eq!(parse_clock("07:30:15"), NaiveTime::from_hms_opt(7, 30, 15));
    }

    #[test]
    fn test_parse_clock_rejects_garbage() {
        assert_eq!(parse_clock("soon"), None);
        assert_eq!(parse_clock("25:00"), None);
        assert_eq!(parse_clock("6:4"), None);
        assert_eq!(parse_clock("+6:40"), None);
        assert_eq!(parse_clock("10:00:00:00"), None);
        assert_eq!(parse_clock(""), None);
    }

    #[test]
    fn test_numeric_order_differs_from_lexicographic() {
        // Plain string comparison puts "6:44" after "15:06".
        assert!("6:44" > "15:06");
        assert!(requested_time_key("6:44") < requested_time_key("15:06"));
    }

    #[test]
    fn test_unparsed_values_sort_last() {
        let mut keys = vec![
            requested_time_key("asap"),
            requested_time_key("19:59"),
            requested_time_key("after lunch"),
            requested_time_key("6:44"),
        ];
        keys.sort();

        assert_eq!(
            keys,
            vec![
                RequestedTimeKey::Clock(NaiveTime::from_hms_opt(6, 44, 0).unwrap()),
                RequestedTimeKey::Clock(NaiveTime::from_hms_opt(19, 59, 0).unwrap()),
                RequestedTimeKey::Text("after lunch".to_string()),
                RequestedTimeKey::Text("asap".to_string()),
            ]
        );
    }
}
