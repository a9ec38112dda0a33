use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct RoadmapPhase {
    pub phase: u8,
    pub title: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct SocialLink {
    pub name: &'static str,
    pub url: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct SiteContent {
    pub name: &'static str,
    pub headline: &'static str,
    pub tagline: &'static str,
    pub roadmap: Vec<RoadmapPhase>,
    pub whitepaper: &'static str,
    pub socials: Vec<SocialLink>,
}

const ROADMAP: [&str; 4] = [
    "Presale Launch",
    "Community Growth",
    "Exchange Listings",
    "Ecosystem Expansion",
];

pub fn site_content() -> SiteContent {
    SiteContent {
        name: "Cryptix",
        headline: "The Future of Crypto Starts with Cryptix",
        tagline: "Fast. Secure. Limitless. Join the presale and become an early believer of CRPX.",
        roadmap: ROADMAP
            .iter()
            .enumerate()
            .map(|(i, title)| RoadmapPhase {
                phase: i as u8 + 1,
                title,
            })
            .collect(),
        whitepaper: "/whitepaper.pdf",
        socials: vec![
            SocialLink {
                name: "Telegram",
                url: "https://t.me/cryptixcoin",
            },
            SocialLink {
                name: "X",
                url: "https://x.com/cryptix_ai25?s=21",
            },
            // Not published yet
            SocialLink {
                name: "Discord",
                url: "#",
            },
            SocialLink {
                name: "Website",
                url: "#",
            },
        ],
    }
}
