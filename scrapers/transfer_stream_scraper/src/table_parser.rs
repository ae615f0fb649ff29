use scraper::{ElementRef, Html, Selector};

use crate::{
    error::ParseError,
    pagination::club_stream_url,
    types::{ClubSummary, TransferEdge},
    utils::{cell_text, is_academy, parse_count, parse_money},
};

/// Body rows of the `table.items` listing. Nested tables inside cells are
/// not descended into.
pub fn table_rows(document: &Html) -> Result<Vec<ElementRef<'_>>, ParseError> {
    let table_selector = Selector::parse("table.items").unwrap();
    let tbody_selector = Selector::parse("tbody").unwrap();

    let table = document
        .select(&table_selector)
        .next()
        .ok_or(ParseError::MissingElement("table.items"))?;
    let tbody = table
        .select(&tbody_selector)
        .next()
        .ok_or(ParseError::MissingElement("table.items tbody"))?;

    Ok(tbody
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr")
        .collect())
}

fn row_cells<'a>(row: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let cell_selector = Selector::parse("td").unwrap();
    row.select(&cell_selector).collect()
}

fn cell<'a, 'b>(cells: &'b [ElementRef<'a>], index: usize) -> Result<&'b ElementRef<'a>, ParseError> {
    cells.get(index).ok_or(ParseError::MissingCell {
        index,
        found: cells.len(),
    })
}

fn attr_in(cell: &ElementRef, index: usize, selector: &str, attr: &'static str) -> Result<String, ParseError> {
    let selector = Selector::parse(selector).unwrap();
    cell.select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|value| value.trim().to_string())
        .ok_or(ParseError::MissingAttribute { index, attr })
}

pub fn extract_club_summary(row: &ElementRef) -> Result<ClubSummary, ParseError> {
    let cells = row_cells(row);

    let name_cell = cell(&cells, 2)?;
    let href = attr_in(name_cell, 2, "a", "href")?;
    let detail_url = club_stream_url(&href)?;

    Ok(ClubSummary {
        name: cell_text(name_cell),
        country: attr_in(cell(&cells, 3)?, 3, "img", "alt")?,
        expenditure: parse_money(&cell_text(cell(&cells, 4)?)),
        arrivals: parse_count(&cell_text(cell(&cells, 5)?), 5)?,
        income: parse_money(&cell_text(cell(&cells, 6)?)),
        departures: parse_count(&cell_text(cell(&cells, 7)?), 7)?,
        balance: parse_money(&cell_text(cell(&cells, 8)?)),
        top_tier: true,
        detail_url,
    })
}

pub fn extract_transfer_edge(row: &ElementRef, destination_club: &str) -> Result<TransferEdge, ParseError> {
    let cells = row_cells(row);

    let origin_club = cell_text(cell(&cells, 2)?);
    let arrivals = parse_count(&cell_text(cell(&cells, 3)?), 3)? as i32;
    let departures = parse_count(&cell_text(cell(&cells, 4)?), 4)? as i32;
    let net_transfers = arrivals - departures;

    // Loan-only rows carry no meaningful fee.
    let volume = if net_transfers != 0 {
        parse_money(&cell_text(cell(&cells, 5)?))
    } else {
        0.0
    };

    Ok(TransferEdge {
        is_academy: is_academy(destination_club, &origin_club),
        destination_club: destination_club.to_string(),
        origin_club,
        net_transfers,
        volume,
    })
}

pub fn parse_club_summaries(html: &str) -> Result<Vec<ClubSummary>, ParseError> {
    let document = Html::parse_document(html);
    table_rows(&document)?
        .iter()
        .map(extract_club_summary)
        .collect()
}

pub fn parse_transfer_edges(html: &str, destination_club: &str) -> Result<Vec<TransferEdge>, ParseError> {
    let document = Html::parse_document(html);
    table_rows(&document)?
        .iter()
        .map(|row| extract_transfer_edge(row, destination_club))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn income_page(rows: &str) -> String {
        format!(
            r#"<html><body><div class="responsive-table"><table class="items">
            <thead><tr><th>#</th><th></th><th>Club</th><th>Country</th></tr></thead>
            <tbody>{rows}</tbody></table></div></body></html>"#
        )
    }

    const CHELSEA_ROW: &str = r#"<tr>
        <td>1</td>
        <td><img src="chelsea.png" alt="Chelsea FC"></td>
        <td><a href="/fc-chelsea/transfers/verein/631/saison_id/2021">Chelsea FC</a></td>
        <td><img src="flag.png" alt="England" title="England"></td>
        <td>€950.50m</td>
        <td>78</td>
        <td>€720.00m</td>
        <td>81</td>
        <td>-€230.50m</td>
    </tr>"#;

    #[test]
    fn test_extract_club_summary() {
        let clubs = parse_club_summaries(&income_page(CHELSEA_ROW)).unwrap();

        assert_eq!(clubs.len(), 1);
        let club = &clubs[0];
        assert_eq!(club.name, "Chelsea FC");
        assert_eq!(club.country, "England");
        assert_eq!(club.expenditure, 950.5);
        assert_eq!(club.arrivals, 78);
        assert_eq!(club.income, 720.0);
        assert_eq!(club.departures, 81);
        assert_eq!(club.balance, -230.5);
        assert!(club.top_tier);
        assert_eq!(
            club.detail_url,
            "https://www.transfermarkt.us/fc-chelsea/transferstroeme/verein/631/saisonIdVon/2016/saisonIdBis/2021/zuab/zu/verein_id//plus/0/"
        );
    }

    #[test]
    fn test_missing_table_is_structural_error() {
        let err = parse_club_summaries("<html><body><p>Blocked</p></body></html>").unwrap_err();
        assert!(matches!(err, ParseError::MissingElement("table.items")));
    }

    #[test]
    fn test_short_row_is_structural_error() {
        let html = income_page("<tr><td>1</td><td></td><td><a href=\"/x/transfers/verein/1/\">X</a></td></tr>");
        let err = parse_club_summaries(&html).unwrap_err();
        assert!(matches!(err, ParseError::MissingCell { index: 3, found: 3 }));
    }

    #[test]
    fn test_missing_flag_is_structural_error() {
        let row = CHELSEA_ROW.replace(r#"<img src="flag.png" alt="England" title="England">"#, "England");
        let err = parse_club_summaries(&income_page(&row)).unwrap_err();
        assert!(matches!(err, ParseError::MissingAttribute { index: 3, attr: "alt" }));
    }

    fn stream_row(origin: &str, arrivals: &str, departures: &str, volume: &str) -> String {
        format!(
            r#"<tr><td>1</td><td><img alt="{origin}"></td><td><a href="/c/startseite/verein/9">{origin}</a></td>
            <td>{arrivals}</td><td>{departures}</td><td>{volume}</td></tr>"#
        )
    }

    #[test]
    fn test_extract_transfer_edges() {
        let rows = [
            stream_row("Real Madrid Castilla Primavera", "4", "1", "€800Th."),
            stream_row("Atletico Madrid", "1", "1", "€12.00m"),
            stream_row("FC Porto", "0", "2", "€30.00m"),
        ]
        .concat();
        let edges = parse_transfer_edges(&income_page(&rows), "Real Madrid").unwrap();

        assert_eq!(
            edges,
            vec![
                TransferEdge {
                    destination_club: "Real Madrid".to_string(),
                    origin_club: "Real Madrid Castilla Primavera".to_string(),
                    net_transfers: 3,
                    volume: 0.8,
                    is_academy: true,
                },
                TransferEdge {
                    destination_club: "Real Madrid".to_string(),
                    origin_club: "Atletico Madrid".to_string(),
                    net_transfers: 0,
                    volume: 0.0,
                    is_academy: false,
                },
                TransferEdge {
                    destination_club: "Real Madrid".to_string(),
                    origin_club: "FC Porto".to_string(),
                    net_transfers: -2,
                    volume: 30.0,
                    is_academy: false,
                },
            ]
        );
    }

    #[test]
    fn test_loan_row_does_not_need_fee_cell() {
        let row = r#"<tr><td>1</td><td></td><td>Loan FC</td><td>2</td><td>2</td></tr>"#;
        let edges = parse_transfer_edges(&income_page(row), "Home FC").unwrap();
        assert_eq!(edges[0].net_transfers, 0);
        assert_eq!(edges[0].volume, 0.0);
    }

    #[test]
    fn test_bad_count_is_structural_error() {
        let row = stream_row("Somewhere FC", "n/a", "0", "-");
        let err = parse_transfer_edges(&income_page(&row), "Home FC").unwrap_err();
        assert!(matches!(err, ParseError::InvalidCount { index: 3, .. }));
    }

    #[test]
    fn test_empty_table_has_no_records() {
        assert!(parse_transfer_edges(&income_page(""), "Home FC").unwrap().is_empty());
    }
}
