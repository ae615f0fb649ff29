use regex::Regex;
use scraper::{Html, Selector};

use crate::error::ParseError;

pub const SITE_ROOT: &str = "https://www.transfermarkt.us";
pub const INCOME_LIST_URL: &str = "https://www.transfermarkt.us/transfers/einnahmenausgaben/statistik/a/ajax/yw1/ids/a/sa//saison_id/2016/saison_id_bis/2021/land_id/0/nat/0/kontinent_id/0/pos//w_s//intern/0/plus/1/sort/saldo.desc";
pub const CLUBS_PER_PAGE: usize = 25;
const SEASON_FROM: u16 = 2016;
const SEASON_TO: u16 = 2021;

/// Income ranking pages needed to cover `target_clubs`, first page first.
pub fn plan_income_pages(target_clubs: usize) -> Vec<String> {
    let pages = target_clubs.div_ceil(CLUBS_PER_PAGE).max(1);

    let mut urls = Vec::with_capacity(pages);
    urls.push(INCOME_LIST_URL.to_string());
    urls.extend((2..=pages).map(|page| format!("{}/page/{}", INCOME_LIST_URL, page)));
    urls
}

/// Rewrites a club link from the income ranking
/// (`/fc-chelsea/transfers/verein/631/...`) into the first page of that
/// club's incoming transfer streams over the tracked seasons.
pub fn club_stream_url(href: &str) -> Result<String, ParseError> {
    let pattern = Regex::new(r"(/.+/)transfers(/verein/\d+)/").unwrap();
    let caps = pattern
        .captures(href)
        .ok_or_else(|| ParseError::MalformedClubLink(href.to_string()))?;

    Ok(format!(
        "{}{}transferstroeme{}/saisonIdVon/{}/saisonIdBis/{}/zuab/zu/verein_id//plus/0/",
        SITE_ROOT, &caps[1], &caps[2], SEASON_FROM, SEASON_TO
    ))
}

/// Reads the highest page number from a stream page's pagination control.
/// `None` means the control is absent and everything is on the first page.
pub fn last_stream_page(html: &str) -> Result<Option<u32>, ParseError> {
    let document = Html::parse_document(html);
    let list_selector = Selector::parse("ul.tm-pagination").unwrap();
    let item_selector = Selector::parse("li").unwrap();
    let link_selector = Selector::parse("a").unwrap();

    let Some(list) = document.select(&list_selector).next() else {
        return Ok(None);
    };
    let link = list
        .select(&item_selector)
        .last()
        .and_then(|item| item.select(&link_selector).next())
        .ok_or(ParseError::MalformedPagination)?;

    let page_in_href = Regex::new(r"page/(\d+)/?$").unwrap();
    let from_href = link
        .value()
        .attr("href")
        .and_then(|href| page_in_href.captures(href.trim()))
        .and_then(|caps| caps[1].parse::<u32>().ok());
    let from_text = || link.text().collect::<String>().trim().parse::<u32>().ok();

    from_href
        .or_else(from_text)
        .map(Some)
        .ok_or(ParseError::MalformedPagination)
}

/// URLs for stream pages 2..N of one club, discovered from its first page.
/// `None` when the first page has no pagination control.
pub fn plan_stream_pages(first_page_html: &str, first_page_url: &str) -> Result<Option<Vec<String>>, ParseError> {
    let Some(last_page) = last_stream_page(first_page_html)? else {
        return Ok(None);
    };

    Ok(Some(
        (2..=last_page)
            .map(|page| format!("{}page/{}", first_page_url, page))
            .collect(),
    ))
}
