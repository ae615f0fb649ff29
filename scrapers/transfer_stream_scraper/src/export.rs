use anyhow::Result;
use std::{fs, path::Path};
use tracing::info;

use crate::types::CrawlOutput;

pub const CLUBS_FILE: &str = "clubs.csv";
pub const TRANSFERS_FILE: &str = "transfers.csv";

/// Writes the crawled records as `clubs.csv` and `transfers.csv` under
/// `output_dir`, creating it if needed.
pub fn write_csv(records: &CrawlOutput, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    let clubs_path = output_dir.join(CLUBS_FILE);
    let mut wtr = csv::Writer::from_path(&clubs_path)?;
    wtr.write_record([
        "name",
        "country",
        "expenditure",
        "arrivals",
        "income",
        "departures",
        "balance",
        "top_tier",
        "detail_url",
    ])?;
    for club in &records.clubs {
        wtr.write_record([
            club.name.clone(),
            club.country.clone(),
            club.expenditure.to_string(),
            club.arrivals.to_string(),
            club.income.to_string(),
            club.departures.to_string(),
            club.balance.to_string(),
            club.top_tier.to_string(),
            club.detail_url.clone(),
        ])?;
    }
    wtr.flush()?;
    info!("Wrote {} clubs to {:?}", records.clubs.len(), clubs_path);

    let transfers_path = output_dir.join(TRANSFERS_FILE);
    let mut wtr = csv::Writer::from_path(&transfers_path)?;
    for transfer in &records.transfers {
        wtr.serialize(transfer)?;
    }
    wtr.flush()?;
    info!("Wrote {} transfers to {:?}", records.transfers.len(), transfers_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClubSummary, TransferEdge};

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let records = CrawlOutput {
            clubs: vec![ClubSummary {
                name: "Olympique Lyon".to_string(),
                country: "France".to_string(),
                expenditure: 120.5,
                arrivals: 30,
                income: 250.0,
                departures: 35,
                balance: 129.5,
                top_tier: true,
                detail_url: "https://example.test/lyon/".to_string(),
            }],
            transfers: vec![TransferEdge {
                destination_club: "Olympique Lyon".to_string(),
                origin_club: "Olympique Lyon B".to_string(),
                net_transfers: 4,
                volume: 0.0,
                is_academy: true,
            }],
        };

        write_csv(&records, dir.path()).unwrap();

        let clubs = fs::read_to_string(dir.path().join(CLUBS_FILE)).unwrap();
        let mut lines = clubs.lines();
        assert!(lines.next().unwrap().starts_with("name,country,expenditure"));
        assert_eq!(
            lines.next().unwrap(),
            "Olympique Lyon,France,120.5,30,250,35,129.5,true,https://example.test/lyon/"
        );

        let transfers = fs::read_to_string(dir.path().join(TRANSFERS_FILE)).unwrap();
        assert_eq!(
            transfers.lines().collect::<Vec<_>>(),
            vec![
                "destination_club,origin_club,net_transfers,volume,is_academy",
                "Olympique Lyon,Olympique Lyon B,4,0.0,true",
            ]
        );
    }
}
