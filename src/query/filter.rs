use std::collections::HashMap;

use time::{macros::format_description, format_description::well_known::Rfc3339, Date, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Only the exact lowercase words are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn to_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: &'static str,
    pub direction: SortDirection,
}

impl Default for Ordering {
    fn default() -> Self {
        Self {
            field: "id",
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Case-insensitive substring match.
    Contains(String),
    Equals(String),
    /// `None` tests for NULL.
    EqualsNumber(Option<i64>),
    CreatedOnOrAfter(OffsetDateTime),
    CreatedOnOrBefore(OffsetDateTime),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: &'static str,
    pub condition: Condition,
}

/// Predicates joined with OR. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub any_of: Vec<Predicate>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.any_of.is_empty()
    }
}

/// Builds the ordering and filter for a list endpoint from its query string.
///
/// `recognized` is the ordered list of keys the endpoint understands; any
/// other key is ignored. `startDate`/`endDate` bound the creation timestamp,
/// keys ending in `Enum` compare by equality on the stripped name, keys
/// ending in `Id` compare numerically (`"null"` meaning NULL) and everything
/// else is a case-insensitive substring search.
pub fn build_filter(
    query: &HashMap<String, String>,
    recognized: &[&'static str],
) -> (Ordering, Filter) {
    let direction = match (query.get("orderBy"), query.get("sort")) {
        (Some(_), Some(sort)) => SortDirection::parse(sort),
        _ => None,
    };
    let order_by = query.get("orderBy").map(String::as_str);

    let mut ordering = None;
    let mut filter = Filter::default();

    for &item in recognized {
        if let (Some(direction), Some(order_by)) = (direction, order_by) {
            if item == "startDate" && order_by == "createdAt" {
                ordering = Some(Ordering {
                    field: "createdAt",
                    direction,
                });
            } else if item == order_by && item != "startDate" && item != "endDate" {
                ordering = Some(Ordering {
                    field: item,
                    direction,
                });
            }
        }

        let Some(value) = query.get(item) else {
            continue;
        };

        let condition = match item {
            "startDate" => parse_date(value).map(Condition::CreatedOnOrAfter),
            "endDate" => parse_date(value).map(Condition::CreatedOnOrBefore),
            _ if item.ends_with("Enum") => Some(Condition::Equals(value.clone())),
            _ if item.ends_with("Id") => parse_id(value).map(Condition::EqualsNumber),
            _ => Some(Condition::Contains(value.clone())),
        };

        if let Some(condition) = condition {
            let field = match item {
                "startDate" | "endDate" => "createdAt",
                _ => item.strip_suffix("Enum").unwrap_or(item),
            };
            filter.any_of.push(Predicate { field, condition });
        }
    }

    (ordering.unwrap_or_default(), filter)
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|d| d.midnight().assume_utc())
}

/// `Some(None)` is the NULL test; `None` means the value is unusable.
fn parse_id(raw: &str) -> Option<Option<i64>> {
    if raw == "null" {
        return Some(None);
    }
    raw.trim().parse::<i64>().ok().map(Some)
}
