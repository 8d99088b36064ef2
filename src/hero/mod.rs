pub mod assets;
pub mod dates;
pub mod dedupe;
pub mod extract;
pub mod run;
pub mod session;

pub use run::run;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    TnfSlick,
    NepaStatic,
    PatagoniaHero,
    BlackyakSwiper,
    DiscoverySwiper,
    Generic,
}

pub struct BrandSpec {
    pub key: &'static str,
    pub name: &'static str,
    pub url: &'static str,
    pub mode: ExtractMode,
    pub max_items: usize,
}

/// The monitored storefronts. Sites with a known main-slider structure
/// get a dedicated extractor; the rest go through the generic
/// top-of-page scan.
pub const BRANDS: &[BrandSpec] = &[
    BrandSpec { key: "tnf", name: "The North Face", url: "https://www.thenorthfacekorea.co.kr/", mode: ExtractMode::TnfSlick, max_items: 3 },
    BrandSpec { key: "nepa", name: "NEPA", url: "https://www.nplus.co.kr/main/main.asp", mode: ExtractMode::NepaStatic, max_items: 3 },
    BrandSpec { key: "patagonia", name: "Patagonia", url: "https://www.patagonia.co.kr/", mode: ExtractMode::PatagoniaHero, max_items: 1 },
    BrandSpec { key: "blackyak", name: "Black Yak", url: "https://www.byn.kr/blackyak", mode: ExtractMode::BlackyakSwiper, max_items: 3 },
    BrandSpec { key: "discovery", name: "Discovery", url: "https://www.discovery-expedition.com/?gf=A", mode: ExtractMode::DiscoverySwiper, max_items: 3 },
    BrandSpec { key: "arcteryx", name: "Arc'teryx", url: "https://www.arcteryx.co.kr/", mode: ExtractMode::Generic, max_items: 3 },
    BrandSpec { key: "salomon", name: "Salomon", url: "https://salomon.co.kr/", mode: ExtractMode::Generic, max_items: 3 },
    BrandSpec { key: "snowpeak", name: "Snow Peak", url: "https://www.snowpeakstore.co.kr/", mode: ExtractMode::Generic, max_items: 3 },
    BrandSpec { key: "natgeo", name: "National Geographic", url: "https://www.natgeokorea.com/", mode: ExtractMode::Generic, max_items: 3 },
    BrandSpec { key: "kolonsport", name: "Kolon Sport", url: "https://www.kolonsport.com/", mode: ExtractMode::Generic, max_items: 3 },
    BrandSpec { key: "k2", name: "K2", url: "https://www.k2.co.kr/", mode: ExtractMode::Generic, max_items: 3 },
    BrandSpec { key: "montbell", name: "Montbell", url: "https://www.montbell.co.kr/", mode: ExtractMode::Generic, max_items: 3 },
    BrandSpec { key: "eider", name: "Eider", url: "https://www.eider.co.kr/", mode: ExtractMode::Generic, max_items: 3 },
];
