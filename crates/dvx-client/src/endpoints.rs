//! API endpoint URL builders
//!
//! Helper functions to construct warehouse API URLs. Kept as pure functions
//! so the query grammar (repeated parameters, `filter=` expressions, metadata
//! field projections) is testable without a client.

use crate::types::{OrgUnitFilter, PayloadFormat, RecordScope, SubmitOptions, TimeWindow};

/// Field projection requested for organisation units
const ORG_UNIT_FIELDS: &str = "id,name,level,parent[id],children[id]";

/// Field projection requested for datasets
const DATA_SET_FIELDS: &str = "id,periodType,dataSetElements[dataElement[id]],organisationUnits[id,name,level]";

/// Build the organisation-unit catalog URL
pub fn org_units_url(base_url: &str, filter: &OrgUnitFilter) -> String {
    let mut url = format!(
        "{}/api/organisationUnits?fields={}&paging=false",
        base_url, ORG_UNIT_FIELDS
    );

    if let Some(level) = filter.level {
        url.push_str(&format!("&filter=level:eq:{}", level));
    }

    if !filter.names.is_empty() {
        let names: Vec<String> = filter
            .names
            .iter()
            .map(|n| urlencoding::encode(n).into_owned())
            .collect();
        url.push_str(&format!("&filter=name:in:[{}]", names.join(",")));
    }

    url
}

/// Build the dataset membership URL for a set of dataset ids
pub fn data_sets_url(base_url: &str, dataset_ids: &[String]) -> String {
    format!(
        "{}/api/dataSets?fields={}&paging=false&filter=id:in:[{}]",
        base_url,
        DATA_SET_FIELDS,
        dataset_ids.join(",")
    )
}

/// Build a data-value export URL for one extraction scope
pub fn data_value_sets_export_url(
    base_url: &str,
    format: PayloadFormat,
    scope: &RecordScope,
) -> String {
    let mut url = format!("{}/api/dataValueSets.{}?", base_url, format.extension());

    let mut params: Vec<String> = scope
        .dataset_ids
        .iter()
        .map(|id| format!("dataSet={}", id))
        .collect();
    params.push(format!("orgUnit={}", scope.org_unit));

    match &scope.window {
        TimeWindow::DateRange { start, end } => {
            params.push(format!("startDate={}", start));
            params.push(format!("endDate={}", end));
        },
        TimeWindow::Periods(periods) => {
            params.extend(periods.iter().map(|p| format!("period={}", p)));
        },
    }

    if scope.children {
        params.push("children=true".to_string());
    }

    url.push_str(&params.join("&"));
    url
}

/// Build a SQL-view extraction URL.
///
/// View criteria are passed as repeated `var=` bindings; the view itself
/// fixes the column set (`dx,pe,ou,co,ao,value`).
pub fn sql_view_data_url(base_url: &str, view_id: &str, scope: &RecordScope) -> String {
    let mut params = vec![format!("var=orgUnit:{}", scope.org_unit)];

    match &scope.window {
        TimeWindow::DateRange { start, end } => {
            params.push(format!("var=startDate:{}", start));
            params.push(format!("var=endDate:{}", end));
        },
        TimeWindow::Periods(periods) => {
            params.push(format!("var=periods:{}", periods.join(";")));
        },
    }

    format!(
        "{}/api/sqlViews/{}/data.csv?{}",
        base_url,
        view_id,
        params.join("&")
    )
}

/// Build the data-value import URL with submit options
pub fn data_value_sets_import_url(base_url: &str, options: &SubmitOptions) -> String {
    let mut url = format!(
        "{}/api/dataValueSets?strategy={}&async={}",
        base_url,
        options.strategy.as_str(),
        options.async_import
    );

    if options.dry_run {
        url.push_str("&dryRun=true");
    }

    if options.skip_audit {
        url.push_str("&skipAudit=true");
    }

    if let Some(scheme) = &options.id_scheme {
        url.push_str(&format!("&idScheme={}", scheme));
    }

    url
}

/// Build the system-info URL (connectivity probe)
pub fn system_info_url(base_url: &str) -> String {
    format!("{}/api/system/info", base_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImportStrategy;
    use chrono::NaiveDate;

    fn scope() -> RecordScope {
        RecordScope {
            dataset_ids: vec!["BfMAe6Itzgt".to_string(), "QX4ZTUbOt3a".to_string()],
            org_unit: "O6uvpzGd5pu".to_string(),
            window: TimeWindow::DateRange {
                start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            },
            children: true,
        }
    }

    #[test]
    fn test_org_units_url() {
        let url = org_units_url("http://localhost:8080", &OrgUnitFilter::at_level(3));
        assert_eq!(
            url,
            "http://localhost:8080/api/organisationUnits?fields=id,name,level,parent[id],children[id]&paging=false&filter=level:eq:3"
        );
    }

    #[test]
    fn test_org_units_url_with_name_allow_list() {
        let filter = OrgUnitFilter::by_names(vec!["Bo".to_string(), "Bombali East".to_string()]);
        let url = org_units_url("http://localhost:8080", &filter);
        assert!(url.ends_with("&filter=name:in:[Bo,Bombali%20East]"));
    }

    #[test]
    fn test_data_sets_url() {
        let ids = vec!["BfMAe6Itzgt".to_string(), "QX4ZTUbOt3a".to_string()];
        let url = data_sets_url("http://localhost:8080", &ids);
        assert!(url.starts_with("http://localhost:8080/api/dataSets?fields="));
        assert!(url.ends_with("&filter=id:in:[BfMAe6Itzgt,QX4ZTUbOt3a]"));
    }

    #[test]
    fn test_export_url_date_range() {
        let url = data_value_sets_export_url("http://localhost:8080", PayloadFormat::Csv, &scope());
        assert_eq!(
            url,
            "http://localhost:8080/api/dataValueSets.csv?dataSet=BfMAe6Itzgt&dataSet=QX4ZTUbOt3a&orgUnit=O6uvpzGd5pu&startDate=2024-01-01&endDate=2024-06-30&children=true"
        );
    }

    #[test]
    fn test_export_url_periods() {
        let mut scope = scope();
        scope.window = TimeWindow::Periods(vec!["202401".to_string(), "202402".to_string()]);
        scope.children = false;

        let url = data_value_sets_export_url("http://localhost:8080", PayloadFormat::Json, &scope);
        assert_eq!(
            url,
            "http://localhost:8080/api/dataValueSets.json?dataSet=BfMAe6Itzgt&dataSet=QX4ZTUbOt3a&orgUnit=O6uvpzGd5pu&period=202401&period=202402"
        );
    }

    #[test]
    fn test_sql_view_url() {
        let url = sql_view_data_url("http://localhost:8080", "qMYMT0iUGkG", &scope());
        assert_eq!(
            url,
            "http://localhost:8080/api/sqlViews/qMYMT0iUGkG/data.csv?var=orgUnit:O6uvpzGd5pu&var=startDate:2024-01-01&var=endDate:2024-06-30"
        );
    }

    #[test]
    fn test_import_url() {
        let url = data_value_sets_import_url("http://localhost:8080", &SubmitOptions::default());
        assert_eq!(
            url,
            "http://localhost:8080/api/dataValueSets?strategy=NEW_AND_UPDATES&async=false"
        );

        let options = SubmitOptions {
            strategy: ImportStrategy::New,
            async_import: true,
            dry_run: true,
            skip_audit: true,
            id_scheme: Some("CODE".to_string()),
        };
        let url = data_value_sets_import_url("http://localhost:8080", &options);
        assert_eq!(
            url,
            "http://localhost:8080/api/dataValueSets?strategy=NEW&async=true&dryRun=true&skipAudit=true&idScheme=CODE"
        );
    }

    #[test]
    fn test_system_info_url() {
        assert_eq!(
            system_info_url("http://localhost:8080"),
            "http://localhost:8080/api/system/info"
        );
    }
}
