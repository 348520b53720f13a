use icu_collator::options::CollatorOptions;
use icu_collator::{Collator, CollatorPreferences};

use crate::common::SortOrder;
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::model::Model;
use crate::record::Record;

/// Declarative query parameters consumed by `get_all`.
///
/// Each entry is either a `sort` directive of the form `field` or
/// `field,desc` (repeatable; evaluated in the order given) or a filter
/// entry pairing a recognized record field with a pattern that may contain
/// the `*` wildcard.
///
/// # Examples
///
/// ```rust,ignore
/// use jsonrepo::query::QueryParams;
///
/// let params = QueryParams::new()
///     .filter("Name", "Al*")
///     .sort("Name,desc")
///     .sort("Email");
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    sort: Vec<String>,
    filters: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty set of query parameters.
    pub fn new() -> Self {
        QueryParams::default()
    }

    /// Appends a sort directive (`field` or `field,desc`). Directives are
    /// applied in the order they were added.
    pub fn sort(mut self, directive: &str) -> Self {
        self.sort.push(directive.to_string());
        self
    }

    /// Appends a filter entry matching `field` against `pattern`, where
    /// `*` in the pattern matches any run of characters.
    pub fn filter(mut self, field: &str, pattern: &str) -> Self {
        self.filters.push((field.to_string(), pattern.to_string()));
        self
    }

    /// Checks whether no directives have been added.
    pub fn is_empty(&self) -> bool {
        self.sort.is_empty() && self.filters.is_empty()
    }

    pub(crate) fn sort_directives(&self) -> &[String] {
        &self.sort
    }

    pub(crate) fn filter_entries(&self) -> &[(String, String)] {
        &self.filters
    }
}

/// One parsed sort directive.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SortSpec {
    pub(crate) field: String,
    pub(crate) order: SortOrder,
}

/// One parsed filter directive.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FilterSpec {
    pub(crate) field: String,
    pub(crate) pattern: String,
}

/// Parses query parameters into sort and filter spec lists.
///
/// A filter referencing a field the model does not recognize short-circuits
/// the whole query with [ErrorKind::InvalidFieldName]; sort fields are not
/// validated (records missing a sort field order first via the null rule).
pub(crate) fn parse(
    params: &QueryParams,
    model: &Model,
) -> RepoResult<(Vec<SortSpec>, Vec<FilterSpec>)> {
    let mut sort_specs = Vec::new();
    for directive in params.sort_directives() {
        let mut tokens = directive.split(',');
        let field = tokens.next().unwrap_or_default().trim().to_string();
        let descending = tokens
            .next()
            .map(|token| token.trim() == "desc")
            .unwrap_or(false);
        sort_specs.push(SortSpec {
            field,
            order: if descending {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            },
        });
    }

    let mut filter_specs = Vec::new();
    for (field, pattern) in params.filter_entries() {
        if !model.has_field(field) {
            return Err(RepoError::new(
                &format!("{} is not a valid filter", field),
                ErrorKind::InvalidFieldName,
            ));
        }
        filter_specs.push(FilterSpec {
            field: field.clone(),
            pattern: pattern.clone(),
        });
    }

    Ok((sort_specs, filter_specs))
}

/// Matches `value` against `pattern` where `*` matches any run of
/// characters (including none). The match is case-folded and anchored: the
/// pattern must cover the entire value.
///
/// The pattern is tokenized on `*` and the literal segments are matched
/// directly against the value, so characters that are special in generic
/// pattern engines carry no meaning here.
pub fn glob_match(value: &str, pattern: &str) -> bool {
    let value = value.to_lowercase();
    let pattern = pattern.to_lowercase();

    if !pattern.contains('*') {
        return value == pattern;
    }

    let segments: Vec<&str> = pattern.split('*').collect();
    let mut rest = value.as_str();

    // the first segment is anchored to the start of the value
    let first = segments[0];
    if !rest.starts_with(first) {
        return false;
    }
    rest = &rest[first.len()..];

    // middle segments must appear in order
    for segment in &segments[1..segments.len() - 1] {
        if segment.is_empty() {
            continue;
        }
        match rest.find(segment) {
            Some(pos) => rest = &rest[pos + segment.len()..],
            None => return false,
        }
    }

    // the last segment is anchored to the end of the value
    let last = segments[segments.len() - 1];
    last.is_empty() || rest.ends_with(last)
}

/// Checks whether a record passes every filter spec.
///
/// A missing (null) field value never matches.
pub(crate) fn matches_filters(record: &Record, filter_specs: &[FilterSpec]) -> bool {
    filter_specs.iter().all(|spec| {
        let value = record.get(&spec.field);
        if value.is_null() {
            return false;
        }
        glob_match(&value.to_string(), &spec.pattern)
    })
}

/// Sorts records in place by the given sort specs.
///
/// Specs are evaluated in order; for each spec, null values order before
/// non-null ones, textual values compare through the locale collator (plain
/// lexicographic comparison if no collator is available), and all other
/// values compare through [Value::compare](crate::common::Value::compare).
/// The descending order reverses the comparison; ties fall through to the
/// next spec. The underlying sort is stable.
pub(crate) fn sort_records(records: &mut [Record], sort_specs: &[SortSpec]) {
    if sort_specs.is_empty() {
        return;
    }

    let collator =
        Collator::try_new(CollatorPreferences::default(), CollatorOptions::default()).ok();

    records.sort_by(|a, b| {
        for spec in sort_specs {
            let a_value = a.get(&spec.field);
            let b_value = b.get(&spec.field);

            let cmp = if a_value.is_null() && !b_value.is_null() {
                std::cmp::Ordering::Less
            } else if !a_value.is_null() && b_value.is_null() {
                std::cmp::Ordering::Greater
            } else if a_value.is_null() && b_value.is_null() {
                std::cmp::Ordering::Equal
            } else if let (Some(a), Some(b)) = (a_value.as_string(), b_value.as_string()) {
                collator
                    .as_ref()
                    .map(|cb| cb.compare(a, b))
                    .unwrap_or_else(|| a.cmp(b))
            } else {
                a_value.compare(&b_value)
            };

            if cmp != std::cmp::Ordering::Equal {
                return match spec.order {
                    SortOrder::Ascending => cmp,
                    SortOrder::Descending => cmp.reverse(),
                };
            }
        }
        std::cmp::Ordering::Equal
    });
}
