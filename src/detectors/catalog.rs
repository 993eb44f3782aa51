//! The standard detector catalog.
//!
//! Most detectors are a CSS selector plus a category. Those live here as
//! [`SelectorSpec`] constants; detectors that need structural reasoning are
//! listed by name and implemented in the sibling modules. Catalog order is
//! bank order, and bank order decides which claim survives deduplication.
//!
//! Table constants are named after the detector they define.
#![allow(missing_docs)]

use super::{answers, commerce, knowledge, links, ClassifyFn};

/// Domain attached to records of a table-driven detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordDomain {
    /// The configured publisher domain.
    Publisher,
    /// The configured video domain.
    Video,
    /// A fixed third-party domain.
    Fixed(&'static str),
}

/// Table entry for a selector-driven detector.
#[derive(Debug, Clone, Copy)]
pub struct SelectorSpec {
    /// Detector name.
    pub name: &'static str,
    /// CSS selector, evaluated below the scan root.
    pub css: &'static str,
    /// Category assigned to every hit.
    pub category: &'static str,
    /// Levels to broaden each hit by before recording it.
    pub hops: usize,
    /// Domain assigned to every hit.
    pub domain: RecordDomain,
    /// Attribute that must match a regular expression.
    pub attr_pattern: Option<(&'static str, &'static str)>,
    /// Regular expression the element's own string must match.
    pub own_text: Option<&'static str>,
    /// Skip hits without any text.
    pub require_text: bool,
}

impl SelectorSpec {
    /// Selector detector with defaults: no broadening, publisher domain.
    pub const fn new(name: &'static str, css: &'static str, category: &'static str) -> Self {
        Self {
            name,
            css,
            category,
            hops: 0,
            domain: RecordDomain::Publisher,
            attr_pattern: None,
            own_text: None,
            require_text: false,
        }
    }

    /// Broaden every hit by up to `hops` levels.
    pub const fn hops(mut self, hops: usize) -> Self {
        self.hops = hops;
        self
    }

    /// Attribute hits to a domain.
    pub const fn domain(mut self, domain: RecordDomain) -> Self {
        self.domain = domain;
        self
    }

    /// Require an attribute to match a pattern.
    pub const fn attr_matching(mut self, name: &'static str, pattern: &'static str) -> Self {
        self.attr_pattern = Some((name, pattern));
        self
    }

    /// Require the element's own string to match a pattern.
    pub const fn own_text(mut self, pattern: &'static str) -> Self {
        self.own_text = Some(pattern);
        self
    }

    /// Skip hits without text.
    pub const fn require_text(mut self) -> Self {
        self.require_text = true;
        self
    }
}

/// One entry of a detector catalog.
#[derive(Clone, Copy)]
pub enum CatalogEntry {
    /// Table-driven detector.
    Selector(SelectorSpec),
    /// Hand-written detector.
    Custom(&'static str, ClassifyFn),
}

impl CatalogEntry {
    /// Detector name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Selector(spec) => spec.name,
            Self::Custom(name, _) => *name,
        }
    }
}

// Controls

pub const BUTTON: SelectorSpec = SelectorSpec::new(
    "button",
    r#"[role="link"][jsaction]:not([href]):not([data-href]):not([data-fp-link])"#,
    "link-button",
);
pub const LINKS_ALT: SelectorSpec = SelectorSpec::new("links_alt", "a[data-href]", "link-google_alt");
pub const TWEET: SelectorSpec = SelectorSpec::new(
    "tweet",
    "div[data-init-vis][data-author][data-hveid]",
    "organic-tweet_2",
)
.domain(RecordDomain::Fixed("twitter.com"));
pub const SEE_ALL: SelectorSpec = SelectorSpec::new(
    "see_all",
    r#"div[aria-label="See all"][jsaction][role="button"]"#,
    "link-load_see_all",
);

// Knowledge panel

pub const KNOWLEDGE_PANEL_TITLE: SelectorSpec =
    SelectorSpec::new("knowledge_panel_title", "[data-ru_q]", "link-knowledge_panel_title");
pub const TAB: SelectorSpec = SelectorSpec::new("tab", r#"[role="tab"]"#, "link-knowledge_panel_tab");
pub const FILTER: SelectorSpec =
    SelectorSpec::new("filter", r#"[role="button"][aria-pressed]"#, "link-filter");
pub const OWNER_POST: SelectorSpec = SelectorSpec::new(
    "owner_post",
    r#"div[role="button"][tabindex][jsaction^="fire.enter_gallery_view"]"#,
    "link-knowledge_panel_owner_post",
);

// Local

pub const MAP_IMAGE: SelectorSpec =
    SelectorSpec::new("map_image", r#"img[alt="map expand icon"]"#, "link-google_map").hops(4);
pub const LOCAL_HOURS: SelectorSpec =
    SelectorSpec::new("local_hours", r#"div[aria-label="Hours:"]"#, "answer-local_hours_expand")
        .hops(1);
pub const LOCAL_POPULAR_TIMES: SelectorSpec = SelectorSpec::new(
    "local_popular_times",
    r#"div[aria-label^="Histogram showing popular times"]"#,
    "answer-local_popular_times",
)
.hops(1);
pub const LOCAL_MAP_RESULT: SelectorSpec = SelectorSpec::new(
    "local_map_result",
    r#"a[data-rc_f="rln"][data-ru_gwp][jsaction]"#,
    "link-local_google_maps_results",
);
pub const LOCAL_QUESTIONS: SelectorSpec = SelectorSpec::new(
    "local_questions",
    r#"div[data-attrid^="kc:/local:place"]"#,
    "link-local_questions",
);
pub const LOCAL_MENU: SelectorSpec =
    SelectorSpec::new("local_menu", r#"div[data-attrid^="kc:/local:menu"]"#, "link-local_menu");
pub const LOCAL_DESCRIPTION: SelectorSpec = SelectorSpec::new(
    "local_description",
    r#"div[data-attrid^="kc:/local:scalable attributes"]"#,
    "answer-local_description",
);

// Media and travel

pub const TRAILER: SelectorSpec = SelectorSpec::new(
    "trailer",
    r#"div[data-attrid="kc:/media_common/media_item:video_clips"][lang][data-md] div[role="button"][data-logged][data-index][style]"#,
    "answer-trailer",
);
pub const YOUTUBE_EMBED: SelectorSpec =
    SelectorSpec::new("youtube_embed", "inline-video[data-video-id]", "link-youtube_embed")
        .domain(RecordDomain::Video);
pub const FLIGHTS: SelectorSpec = SelectorSpec::new(
    "flights",
    r#"div[data-fltid][data-flt-ve][role="region"]"#,
    "link-flights_1",
);
pub const FLIGHTS_PRICE_GRAPH: SelectorSpec = SelectorSpec::new(
    "flights_price_graph",
    "div[data-price-graph-bulk-scroll-size][data-black-unclickable-header]",
    "link-flights_2",
);

// Answers

pub const ANSWER_SHORT: SelectorSpec = SelectorSpec::new(
    "answer_short",
    r#"div[data-tts="answers"][data-tts-text][class]"#,
    "answer-feature_snippet_answer_short",
)
.require_text();
pub const MEDICAL: SelectorSpec =
    SelectorSpec::new("medical", r#"div[data-attrid^="kc:/medicine/"]"#, "answer-medical").hops(2);
pub const DATE: SelectorSpec = SelectorSpec::new("date", "h2", "answer-date")
    .own_text("^Date Result$")
    .hops(2);
pub const HOLIDAY_DATES: SelectorSpec = SelectorSpec::new(
    "holiday_dates",
    r#"div[data-attrid^="kc:/events/holiday:dates"]"#,
    "answer-date_2",
);
pub const ANSWER_DROPDOWN: SelectorSpec = SelectorSpec::new(
    "answer_dropdown",
    r#"div[data-async-context-required="q"][data-jiis="up"][data-async-type][id][jsname] div[role="button"][tabindex="0"][jsaction][data-ved]"#,
    "answer-expand_1",
);
pub const EXPAND_ANSWER: SelectorSpec = SelectorSpec::new(
    "expand_answer",
    r#"[aria-expanded="false"][role="button"]"#,
    "answer-expand_2",
);
pub const EXPANDED_ANSWER: SelectorSpec = SelectorSpec::new(
    "expanded_answer",
    r#"div[aria-expanded="true"][role="heading"]"#,
    "answer-expand_3",
);
pub const LYRICS: SelectorSpec = SelectorSpec::new(
    "lyrics",
    r#"div[data-attrid^="kc:/music/recording_cluster:lyrics"]"#,
    "answer-lyrics",
);
pub const TV_EPISODES: SelectorSpec =
    SelectorSpec::new("tv_episodes", r#"div[data-attrid^="kc:/"]"#, "answer-tv_episodes")
        .attr_matching("data-attrid", "^kc:/(.*?):livetv");
pub const DICTIONARY: SelectorSpec =
    SelectorSpec::new("dictionary", r#"div[id="dictionary-modules"]"#, "answer-dictionary");
pub const SPORT_STATS: SelectorSpec = SelectorSpec::new(
    "sport_stats",
    r#"div[data-attrid^="kc:/sports/pro_athlete:stats"]"#,
    "answer-sport_stats",
);
pub const FOOD_NUTRITION: SelectorSpec = SelectorSpec::new(
    "food_nutrition",
    r#"div[data-attrid^="kc:/food/food:energy"]"#,
    "answer-food_nutrients",
)
.hops(1);
pub const QUOTE: SelectorSpec =
    SelectorSpec::new("quote", r#"div[data-attrid="kc:/people/person:quote"]"#, "answer-quote");
pub const FINANCE: SelectorSpec = SelectorSpec::new(
    "finance",
    r#"div[data-attrid^="kc:/finance/stock:"]:not([data-attrid*="carousel"])"#,
    "answer-finance_stocks",
);

// Ads and products

pub const ADS_LOCAL: SelectorSpec =
    SelectorSpec::new("ads_local", r#"li[class^="ads-"], li[class*=" ads-"]"#, "ads-text");
pub const ADS_GENERAL: SelectorSpec =
    SelectorSpec::new("ads_general", r#"div[aria-label="Why these ads?"]"#, "ads-general").hops(6);
pub const ADS_ARIA: SelectorSpec = SelectorSpec::new("ads_aria", r#"[aria-label="Ad"]"#, "ads-aria");
pub const PRODUCT_REFINEMENTS: SelectorSpec = SelectorSpec::new(
    "product_refinements",
    "h3",
    "link-filter_product_refinement",
)
.own_text("Suggested Refinements|Filters List")
.hops(1);
pub const ADS_PRODUCT: SelectorSpec = SelectorSpec::new(
    "ads_product",
    r#"g-inner-card[data-premium="1"][class][jsname]"#,
    "ads-product",
)
.hops(1);
pub const REFINEMENT_CARD: SelectorSpec = SelectorSpec::new(
    "refinement_card",
    r#"g-inner-card[jsaction="fire.refinement_click"][role="button"][class]:not([data-premium])"#,
    "link-filter_refinement",
)
.hops(1);
pub const PRODUCT_FILTER: SelectorSpec = SelectorSpec::new(
    "product_filter",
    r#"span[class][jscontroller][data-immersive][jsaction^="menu_item_selected"]"#,
    "link-filter_product",
);
pub const RATING: SelectorSpec =
    SelectorSpec::new("rating", r#"span[aria-label^="Rated"]"#, "link-reviews_rating").hops(4);
pub const SEARCH_REVIEWS: SelectorSpec = SelectorSpec::new(
    "search_reviews",
    r#"button[class*="product_ads"]"#,
    "link-search_reviews",
);
pub const MOVIE_SHOWTIMES: SelectorSpec = SelectorSpec::new(
    "movie_showtimes",
    r#"div[aria-haspopup="dialog"][role="button"]"#,
    "link-movie_showtimes",
);
pub const VIDEO_TOP_ANSWER: SelectorSpec = SelectorSpec::new(
    "video_top_answer",
    r#"img[alt^="Video"][jsname]"#,
    "link-video_top_answer",
)
.hops(4);

// Miscellaneous

pub const FULLPAGE: SelectorSpec =
    SelectorSpec::new("fullpage", "li[data-encoded-docid]", "link-fullpage");
pub const TOPIC_BAR: SelectorSpec = SelectorSpec::new(
    "topic_bar",
    r#"div[data-iv][data-q][data-ui][role="button"]"#,
    "link-topic",
);
pub const SITE_SEARCH: SelectorSpec = SelectorSpec::new(
    "site_search",
    r#"form[action="/search"][data-site]"#,
    "link-site_search",
);
pub const UGC: SelectorSpec =
    SelectorSpec::new("ugc", r#"div[data-attrid^="kc:/ugc:"]"#, "answer-ugc");
pub const AR_MODEL: SelectorSpec =
    SelectorSpec::new("ar_model", "div[data-attrid]", "link-3d_ar_model")
        .attr_matching("data-attrid", ".ar:model");
pub const MOVIE_TRAILER: SelectorSpec = SelectorSpec::new(
    "movie_trailer",
    r#"div[data-attrid^="kc:/film/film:trailer"]"#,
    "link-movie_trailer",
);
pub const HEALTH: SelectorSpec = SelectorSpec::new(
    "health",
    r#"div[id^="knowledge-health"][data-ved] div[class][data-ved]:not([jscontroller]):not([jsname])"#,
    "answer-knowledge_health",
)
.require_text();
pub const UNIT_CONVERTER: SelectorSpec =
    SelectorSpec::new("unit_converter", "h2", "answer-unit_converter")
        .own_text("^Unit Converter$")
        .hops(1);
pub const PEOPLE_ALSO_SEARCH: SelectorSpec = SelectorSpec::new(
    "people_also_search",
    r#"div[data-attrid^="kc:/local:sideways refinements"] kp-carousel-item a"#,
    "link-local_people_also_search",
);
pub const SPORTS_TABLE: SelectorSpec = SelectorSpec::new(
    "sports_table",
    r#"g-expandable-content[aria-hidden="false"][style][jscontroller][jsaction] table[class]"#,
    "answer-sports_table",
);
pub const VOTES: SelectorSpec =
    SelectorSpec::new("votes", r#"div[jsaction^="submit_votes"]"#, "ads-votes");

/// The standard bank, in registration order.
pub const STANDARD_CATALOG: &[CatalogEntry] = &[
    CatalogEntry::Custom("links", links::links),
    CatalogEntry::Custom("amp", links::amp),
    CatalogEntry::Selector(BUTTON),
    CatalogEntry::Selector(LINKS_ALT),
    CatalogEntry::Custom("load_more", links::load_more),
    CatalogEntry::Selector(TWEET),
    CatalogEntry::Selector(SEE_ALL),
    CatalogEntry::Selector(KNOWLEDGE_PANEL_TITLE),
    CatalogEntry::Selector(TAB),
    CatalogEntry::Selector(FILTER),
    CatalogEntry::Selector(OWNER_POST),
    CatalogEntry::Selector(MAP_IMAGE),
    CatalogEntry::Selector(LOCAL_HOURS),
    CatalogEntry::Selector(LOCAL_POPULAR_TIMES),
    CatalogEntry::Selector(LOCAL_MAP_RESULT),
    CatalogEntry::Selector(LOCAL_QUESTIONS),
    CatalogEntry::Selector(LOCAL_MENU),
    CatalogEntry::Selector(LOCAL_DESCRIPTION),
    CatalogEntry::Selector(TRAILER),
    CatalogEntry::Selector(YOUTUBE_EMBED),
    CatalogEntry::Selector(FLIGHTS),
    CatalogEntry::Selector(FLIGHTS_PRICE_GRAPH),
    CatalogEntry::Selector(ANSWER_SHORT),
    CatalogEntry::Custom("rich_text", answers::rich_text),
    CatalogEntry::Custom("knowledge_panel_description", answers::knowledge_panel_description),
    CatalogEntry::Custom("knowledge_panel_heading", answers::knowledge_panel_heading),
    CatalogEntry::Selector(MEDICAL),
    CatalogEntry::Selector(DATE),
    CatalogEntry::Selector(HOLIDAY_DATES),
    CatalogEntry::Selector(ANSWER_DROPDOWN),
    CatalogEntry::Selector(EXPAND_ANSWER),
    CatalogEntry::Selector(EXPANDED_ANSWER),
    CatalogEntry::Selector(LYRICS),
    CatalogEntry::Selector(TV_EPISODES),
    CatalogEntry::Selector(DICTIONARY),
    CatalogEntry::Selector(SPORT_STATS),
    CatalogEntry::Selector(FOOD_NUTRITION),
    CatalogEntry::Selector(QUOTE),
    CatalogEntry::Selector(FINANCE),
    CatalogEntry::Selector(ADS_LOCAL),
    CatalogEntry::Selector(ADS_GENERAL),
    CatalogEntry::Selector(ADS_ARIA),
    CatalogEntry::Selector(PRODUCT_REFINEMENTS),
    CatalogEntry::Selector(ADS_PRODUCT),
    CatalogEntry::Selector(REFINEMENT_CARD),
    CatalogEntry::Selector(PRODUCT_FILTER),
    CatalogEntry::Selector(RATING),
    CatalogEntry::Custom("reviews", commerce::reviews),
    CatalogEntry::Selector(SEARCH_REVIEWS),
    CatalogEntry::Selector(MOVIE_SHOWTIMES),
    CatalogEntry::Selector(VIDEO_TOP_ANSWER),
    CatalogEntry::Custom("ebook", commerce::ebook),
    CatalogEntry::Selector(FULLPAGE),
    CatalogEntry::Selector(TOPIC_BAR),
    CatalogEntry::Selector(SITE_SEARCH),
    CatalogEntry::Selector(UGC),
    CatalogEntry::Custom("image_reverse", knowledge::image_reverse),
    CatalogEntry::Selector(AR_MODEL),
    CatalogEntry::Selector(MOVIE_TRAILER),
    CatalogEntry::Custom("watchlist", knowledge::watchlist),
    CatalogEntry::Custom("courses", knowledge::courses),
    CatalogEntry::Selector(HEALTH),
    CatalogEntry::Selector(UNIT_CONVERTER),
    CatalogEntry::Selector(PEOPLE_ALSO_SEARCH),
    CatalogEntry::Selector(SPORTS_TABLE),
    CatalogEntry::Custom("factoids", knowledge::factoids),
    CatalogEntry::Custom("map_results", knowledge::map_results),
    CatalogEntry::Selector(VOTES),
];

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn test_catalog_selectors_and_patterns_compile() {
        for entry in STANDARD_CATALOG {
            if let CatalogEntry::Selector(spec) = entry {
                assert!(Selector::parse(spec.css).is_ok(), "{}: {}", spec.name, spec.css);
                if let Some((_, pattern)) = spec.attr_pattern {
                    assert!(regex_lite::Regex::new(pattern).is_ok(), "{}", spec.name);
                }
                if let Some(pattern) = spec.own_text {
                    assert!(regex_lite::Regex::new(pattern).is_ok(), "{}", spec.name);
                }
            }
        }
    }

    #[test]
    fn test_catalog_has_every_detector_once() {
        assert_eq!(STANDARD_CATALOG.len(), 68);
        let mut names: Vec<_> = STANDARD_CATALOG.iter().map(CatalogEntry::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 68);
    }
}
