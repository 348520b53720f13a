/// Specifies the direction for sorting records.
///
/// # Purpose
/// Defines whether records should be sorted in ascending (low to high) or
/// descending (high to low) order. Used in sort directives to control result
/// ordering.
///
/// # Usage
/// Produced when parsing a `sort` directive of the form `field` or
/// `field,desc`:
/// ```text
/// let params = QueryParams::new().sort("Name,desc");
/// let results = repository.get_all(Some(&params))?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortOrder {
    /// Sort in ascending order (smallest to largest, A-Z, oldest to newest)
    Ascending,
    /// Sort in descending order (largest to smallest, Z-A, newest to oldest)
    Descending,
}
