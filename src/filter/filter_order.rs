use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};
use crate::schema::Table;

pub struct FilterOrder;

impl FilterOrder {
    /// Parse `column` or `column dir`; an explicit `dir` argument wins over
    /// the inline direction.
    pub fn validate_and_parse(
        table: Table,
        sort: &str,
        dir: Option<SortDirection>,
    ) -> Result<FilterOrderInfo, FilterError> {
        let mut it = sort.split_whitespace();
        let name = it
            .next()
            .ok_or_else(|| FilterError::InvalidOperatorData("empty sort column".to_string()))?;
        let inline = match it.next() {
            Some(d) => Some(d.parse::<SortDirection>()?),
            None => None,
        };
        if it.next().is_some() {
            return Err(FilterError::InvalidOperatorData(format!("unexpected sort expression: {}", sort)));
        }
        let column = table.column(name)?;
        Ok(FilterOrderInfo { column, sort: dir.or(inline).unwrap_or_default() })
    }

    /// ORDER BY the requested column, then the key columns so paging and
    /// exports are stable.
    pub fn generate(table: Table, order: Option<&FilterOrderInfo>) -> String {
        let mut parts = Vec::new();
        if let Some(info) = order {
            parts.push(format!("{} {}", info.column.quoted(), info.sort.to_sql()));
        }
        for key in table.key_columns() {
            if order.is_some_and(|o| o.column.name == key.name) {
                continue;
            }
            parts.push(format!("{} ASC", key.quoted()));
        }
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order_is_by_key() {
        assert_eq!(FilterOrder::generate(Table::WorksOn, None), "ORDER BY \"essn\" ASC, \"pno\" ASC");
    }

    #[test]
    fn requested_column_comes_first_without_repeating_keys() {
        let info = FilterOrder::validate_and_parse(Table::WorksOn, "pno desc", None).unwrap();
        assert_eq!(FilterOrder::generate(Table::WorksOn, Some(&info)), "ORDER BY \"pno\" DESC, \"essn\" ASC");
    }

    #[test]
    fn explicit_direction_overrides_inline() {
        let info = FilterOrder::validate_and_parse(Table::Employee, "salary desc", Some(SortDirection::Asc)).unwrap();
        assert_eq!(info.sort, SortDirection::Asc);
    }

    #[test]
    fn sort_column_must_be_allow_listed() {
        let err = FilterOrder::validate_and_parse(Table::Employee, "random()", None).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn { .. }));
        let err = FilterOrder::validate_and_parse(Table::Employee, "lname; drop table employee", None).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn { .. } | FilterError::InvalidOperatorData(_)));
    }
}
