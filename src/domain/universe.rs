//! Watchlist parsing with optional sector tags.
//!
//! A watchlist is a comma-separated list of `TICKER` or `TICKER:SECTOR`
//! tokens. Sectors only group results for reporting; scoring never sees them.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchlistEntry {
    pub ticker: String,
    pub sector: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watchlist {
    pub entries: Vec<WatchlistEntry>,
}

impl Watchlist {
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn tickers(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.ticker.clone()).collect()
    }

    /// The built-in universe of Vietnamese equities grouped by sector.
    pub fn default_sectors() -> Self {
        let entries = DEFAULT_SECTORS
            .iter()
            .flat_map(|(sector, tickers)| {
                tickers.iter().map(move |t| WatchlistEntry {
                    ticker: (*t).to_string(),
                    sector: Some((*sector).to_string()),
                })
            })
            .collect();
        Self { entries }
    }
}

const DEFAULT_SECTORS: &[(&str, &[&str])] = &[
    (
        "BANKING",
        &["VCB.HM", "CTG.HM", "TCB.HM", "MBB.HM", "VPB.HM", "LPB.HM"],
    ),
    ("TECH", &["FPT.HM", "CMG.HM", "VGI.HN", "CTR.HM", "ELC.HM"]),
    (
        "OIL",
        &[
            "PVS.HN", "GAS.HM", "BSR.HM", "PVD.HN", "OIL.HN", "CNG.HM", "PVB.HN", "PVC.HN",
        ],
    ),
    (
        "REAL",
        &["DIG.HM", "DXG.HM", "CII.HM", "CEO.HN", "HDC.HM", "CSC.HN", "PDR.HM"],
    ),
    (
        "FINANCE",
        &["SSI.HM", "VND.HM", "EVF.HM", "VDS.HM", "VCI.HM", "VIX.HM", "FTS.HM"],
    ),
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WatchlistError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("empty sector for ticker {0}")]
    EmptySector(String),

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

pub fn parse_watchlist(input: &str) -> Result<Watchlist, WatchlistError> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(WatchlistError::EmptyToken);
        }

        let (ticker, sector) = match trimmed.split_once(':') {
            Some((t, s)) => {
                let t = t.trim().to_uppercase();
                let s = s.trim();
                if t.is_empty() {
                    return Err(WatchlistError::EmptyToken);
                }
                if s.is_empty() {
                    return Err(WatchlistError::EmptySector(t));
                }
                (t, Some(s.to_uppercase()))
            }
            None => (trimmed.to_uppercase(), None),
        };

        if !seen.insert(ticker.clone()) {
            return Err(WatchlistError::DuplicateTicker(ticker));
        }
        entries.push(WatchlistEntry { ticker, sector });
    }

    Ok(Watchlist { entries })
}
