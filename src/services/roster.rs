use std::fs::File;
use std::path::Path;

use calamine::{open_workbook, DataType, Reader, Xlsx};
use serde::Deserialize;
use url::Url;

use crate::domain::target::ScrapeTarget;
use crate::services::page_fetcher::PageFetcher;

/// Primary selectors every target starts with, tried in order.
pub const PRIMARY_SELECTORS: [&str; 11] = [
    ".job-listing",
    ".job-item",
    ".position",
    ".career-item",
    "[class*=\"job\"]",
    "[class*=\"career\"]",
    "[class*=\"position\"]",
    ".opportunity",
    ".role",
    ".opening",
    ".vacancy",
];

/// Career page paths probed off a company's base url, most common first.
const CAREER_PATHS: [&str; 9] = [
    "/careers",
    "/jobs",
    "/career",
    "/join-us",
    "/work-with-us",
    "/opportunities",
    "/talent",
    "/people",
    "/about/careers",
];

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CompanyRecord {
    #[serde(
        rename = "Company",
        alias = "company",
        alias = "Company Name",
        alias = "Name",
        alias = "name"
    )]
    pub name: String,
    #[serde(
        rename = "Website",
        alias = "website",
        alias = "url",
        alias = "URL",
        default
    )]
    pub website: Option<String>,
}

/// Companies monitored on top of whatever the spreadsheet provides.
/// Guessing domains for arbitrary names is out of scope, so every built-in
/// entry carries its website.
pub fn supplementary_companies() -> Vec<CompanyRecord> {
    known_companies(&[
        ("Emirates NBD", "https://www.emiratesnbd.com"),
        ("ADNOC", "https://www.adnoc.ae"),
        ("Mubadala", "https://www.mubadala.com"),
        ("Emaar", "https://www.emaar.com"),
        ("DP World", "https://www.dpworld.com"),
        ("Majid Al Futtaim", "https://www.majidalfuttaim.com"),
        ("Etisalat", "https://www.etisalat.ae"),
        ("DEWA", "https://www.dewa.gov.ae"),
        ("Aramco", "https://www.aramco.com"),
        ("SABIC", "https://www.sabic.com"),
        ("Al Rajhi Bank", "https://www.alrajhibank.com.sa"),
        ("STC", "https://www.stc.com.sa"),
        ("QNB", "https://www.qnb.com"),
        ("Ooredoo", "https://www.ooredoo.com"),
        ("HSBC", "https://www.hsbc.com"),
        ("Barclays", "https://home.barclays"),
        ("Standard Chartered", "https://www.sc.com"),
        ("Lloyds Banking Group", "https://www.lloydsbankinggroup.com"),
        ("Vodafone", "https://www.vodafone.com"),
        ("BP", "https://www.bp.com"),
        ("Shell", "https://www.shell.com"),
        ("Unilever", "https://www.unilever.com"),
        ("AstraZeneca", "https://www.astrazeneca.com"),
        ("Rolls-Royce", "https://www.rolls-royce.com"),
    ])
}

/// Minimal roster used when the spreadsheet cannot be read at all.
pub fn fallback_companies() -> Vec<CompanyRecord> {
    known_companies(&[
        ("Emirates NBD", "https://www.emiratesnbd.com"),
        ("ADNOC", "https://www.adnoc.ae"),
        ("Emaar", "https://www.emaar.com"),
        ("Aramco", "https://www.aramco.com"),
        ("SABIC", "https://www.sabic.com"),
        ("QNB", "https://www.qnb.com"),
        ("HSBC", "https://www.hsbc.com"),
        ("Standard Chartered", "https://www.sc.com"),
        ("BP", "https://www.bp.com"),
        ("Shell", "https://www.shell.com"),
    ])
}

fn known_companies(pairs: &[(&str, &str)]) -> Vec<CompanyRecord> {
    pairs
        .iter()
        .map(|(name, website)| CompanyRecord {
            name: name.to_string(),
            website: Some(website.to_string()),
        })
        .collect()
}

/// Spreadsheet roster plus the built-in supplementary list. An unreadable or
/// empty spreadsheet falls back to the built-in roster; only the caller
/// treats a fully empty roster as fatal.
pub fn load_roster<P: AsRef<Path>>(filename: P) -> Vec<CompanyRecord> {
    let mut records = load_company_records(filename.as_ref());

    match records.is_empty() {
        true => {
            log::warn!(
                "No companies loaded from {:?}; using the built-in fallback roster",
                filename.as_ref()
            );
            fallback_companies()
        }
        false => {
            records.extend(supplementary_companies());
            records
        }
    }
}

fn load_company_records(path: &Path) -> Vec<CompanyRecord> {
    if !path.exists() {
        log::error!("Roster file {:?} does not exist.", path);
        return Vec::new();
    }

    let is_excel = path
        .extension()
        .map_or(false, |ext| ext == "xlsx" || ext == "xls");

    if is_excel {
        return load_excel(path);
    }

    load_csv(path)
}

fn load_csv(path: &Path) -> Vec<CompanyRecord> {
    let mut records = Vec::new();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            log::error!("Could not open roster CSV: {}", e);
            return records;
        }
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    for result in rdr.deserialize() {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                log::error!("Error parsing roster CSV record: {}", e);
            }
        }
    }

    log::info!("Loaded {} companies from CSV {:?}", records.len(), path);
    records
}

fn load_excel(path: &Path) -> Vec<CompanyRecord> {
    let mut records = Vec::new();
    let mut excel: Xlsx<_> = match open_workbook(path) {
        Ok(wb) => wb,
        Err(e) => {
            log::error!("Could not open roster spreadsheet: {}", e);
            return records;
        }
    };

    let worksheets = excel.worksheets();
    if let Some((_name, range)) = worksheets.get(0) {
        let mut name_idx = 0;
        let mut website_idx = None;
        let mut has_header = false;

        if let Some(header_row) = range.rows().next() {
            for (col_idx, cell) in header_row.iter().enumerate() {
                let header = cell.to_string().to_lowercase();
                if header.contains("company") || header.contains("name") {
                    name_idx = col_idx;
                    has_header = true;
                } else if header.contains("website") || header.contains("url") {
                    website_idx = Some(col_idx);
                    has_header = true;
                }
            }
        }

        // Headerless sheets (name in column A, optional website in column B)
        // are the original export format and still supported.
        if !has_header {
            website_idx = Some(1);
        }

        for (row_idx, row) in range.rows().enumerate() {
            if has_header && row_idx == 0 {
                continue;
            }

            let name = row
                .get(name_idx)
                .filter(|cell| !cell.is_empty())
                .map(|cell| cell.to_string())
                .unwrap_or_default();
            let website = website_idx
                .and_then(|i| row.get(i))
                .filter(|cell| !cell.is_empty())
                .map(|cell| cell.to_string());

            if !name.is_empty() {
                records.push(CompanyRecord { name, website });
            }
        }
    }

    log::info!(
        "Loaded {} companies from spreadsheet {:?}",
        records.len(),
        path
    );
    records
}

/// Resolves roster records into scrape targets: parse the base url, probe the
/// usual career paths, first reachable wins, else the base page itself.
/// Companies without a configured website are skipped (domain guessing is
/// deliberately not done).
pub async fn build_targets(
    records: Vec<CompanyRecord>,
    fetcher: &PageFetcher,
) -> Vec<ScrapeTarget> {
    let mut targets = Vec::new();

    for record in records {
        let website = match record.website {
            Some(ref website) if !website.trim().is_empty() => website.trim().to_string(),
            _ => {
                log::warn!("{}: no website configured, skipping", record.name);
                continue;
            }
        };

        let base_url = match Url::parse(&website) {
            Ok(url) => url,
            Err(e) => {
                log::warn!(
                    "{}: invalid website '{}' ({}), skipping",
                    record.name,
                    website,
                    e
                );
                continue;
            }
        };

        let career_url = find_career_page(&website, fetcher).await;
        let url = career_url.unwrap_or_else(|| website.clone());

        targets.push(ScrapeTarget::new(
            record.name,
            url,
            base_url,
            PRIMARY_SELECTORS.iter().map(|s| s.to_string()).collect(),
        ));
    }

    log::info!("Roster resolved to {} scrape targets", targets.len());
    targets
}

async fn find_career_page(base: &str, fetcher: &PageFetcher) -> Option<String> {
    let base = base.trim_end_matches('/');

    for path in CAREER_PATHS {
        let candidate = format!("{}{}", base, path);
        if fetcher.is_reachable(&candidate).await {
            return Some(candidate);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_csv(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "jobwatch-roster-{}-{}.csv",
            std::process::id(),
            name
        ));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn csv_roster_parses_name_and_optional_website() {
        let path = temp_csv(
            "basic",
            "Company,Website\nEmaar,https://www.emaar.com\nMystery Co,\n",
        );

        let records = load_company_records(&path);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Emaar");
        assert_eq!(records[0].website.as_deref(), Some("https://www.emaar.com"));
        assert_eq!(records[1].name, "Mystery Co");
        assert_eq!(records[1].website, None);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_falls_back_to_builtin_roster() {
        let roster = load_roster("/nonexistent/top_companies.xlsx");

        assert_eq!(roster, fallback_companies());
        assert!(!roster.is_empty());
    }

    #[test]
    fn readable_file_is_extended_with_supplementary_companies() {
        let path = temp_csv("extended", "Company,Website\nEmaar,https://www.emaar.com\n");

        let roster = load_roster(&path);

        assert_eq!(roster.len(), 1 + supplementary_companies().len());
        assert_eq!(roster[0].name, "Emaar");

        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn records_without_websites_are_skipped() {
        let fetcher = PageFetcher::new(
            std::time::Duration::from_secs(1),
            std::time::Duration::from_millis(10),
        );
        let records = vec![
            CompanyRecord {
                name: "No Website Co".to_string(),
                website: None,
            },
            CompanyRecord {
                name: "Bad Url Co".to_string(),
                website: Some("not a url".to_string()),
            },
        ];

        let targets = build_targets(records, &fetcher).await;

        assert!(targets.is_empty());
    }
}
