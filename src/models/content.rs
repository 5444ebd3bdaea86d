use serde::{Deserialize, Serialize};

use super::ContentError;

/// Key under which the whole content document is persisted.
pub const CONTENT_KEY: &str = "siteData";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    pub heading: String,
    pub tagline: String,
    pub image: String,
    /// Slider images, in display order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl Hero {
    /// Images the public hero cycles through. Falls back to the single image.
    pub fn slides(&self) -> Vec<String> {
        match &self.images {
            Some(list) if !list.is_empty() => list.clone(),
            _ if !self.image.is_empty() => vec![self.image.clone()],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct About {
    pub title: String,
    pub bio: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

impl ServiceItem {
    /// Uploaded icons are stored as URLs; everything else is a symbolic name.
    pub fn icon_is_image(&self) -> bool {
        is_image_ref(&self.icon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestimonialItem {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub text: String,
    #[serde(default)]
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    pub phone: String,
    pub address: String,
    pub hours: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub text: String,
}

/// The content document. Field names serialize exactly as the stored JSON blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteData {
    pub hero: Hero,
    pub about: About,
    pub portfolio: Vec<PortfolioItem>,
    pub services: Vec<ServiceItem>,
    pub testimonials: Vec<TestimonialItem>,
    pub contact: Contact,
    pub site_name: String,
    pub site_description: String,
    pub menu_items: Vec<MenuItem>,
}

/// Anything carrying a numeric list id.
pub trait Identified {
    fn id(&self) -> i64;
}

impl Identified for PortfolioItem {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Identified for ServiceItem {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Identified for TestimonialItem {
    fn id(&self) -> i64 {
        self.id
    }
}

/// One more than the current maximum id, or 1 for an empty list.
/// Gaps left by deletions are never filled.
pub fn next_id<T: Identified>(items: &[T]) -> Result<i64, ContentError> {
    match items.iter().map(|i| i.id()).max() {
        Some(max) => max.checked_add(1).ok_or(ContentError::IdsExhausted),
        None => Ok(1),
    }
}

/// True for values that point at an image rather than naming a symbol.
pub fn is_image_ref(value: &str) -> bool {
    value.starts_with("http://")
        || value.starts_with("https://")
        || value.starts_with("blob:")
        || value.starts_with('/')
}

// ── Fixed vocabularies ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortfolioCategory {
    Portraits,
    Weddings,
    Nature,
}

impl PortfolioCategory {
    pub const ALL: [PortfolioCategory; 3] = [
        PortfolioCategory::Portraits,
        PortfolioCategory::Weddings,
        PortfolioCategory::Nature,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            PortfolioCategory::Portraits => "portraits",
            PortfolioCategory::Weddings => "weddings",
            PortfolioCategory::Nature => "nature",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PortfolioCategory::Portraits => "Porträtt",
            PortfolioCategory::Weddings => "Bröllop",
            PortfolioCategory::Nature => "Natur",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.slug() == s)
    }
}

/// Symbolic service icons offered by the editor. `custom` means "use the upload".
pub const SERVICE_ICONS: &[(&str, &str)] = &[
    ("wedding", "Bröllop"),
    ("portrait", "Porträtt"),
    ("event", "Event"),
    ("family", "Familj"),
    ("product", "Produkt"),
    ("custom", "Anpassad bild"),
];

pub const DEFAULT_SERVICE_ICON: &str = "default";

/// Subjects offered by the public contact form: (value, label).
pub const CONTACT_SUBJECTS: &[(&str, &str)] = &[
    ("Portrait Inquiry", "Porträttförfrågan"),
    ("Wedding Inquiry", "Bröllopsförfrågan"),
    ("Event Inquiry", "Evenemangsförfrågan"),
    ("Other", "Annat"),
];

// ── Defaults ────────────────────────────────────────────────────────

const UNSPLASH: &str = "https://images.unsplash.com";

impl Default for SiteData {
    fn default() -> Self {
        SiteData {
            hero: Hero {
                heading: "ANO".to_string(),
                tagline: "Fångar ögonblick som berättar din historia".to_string(),
                image: format!("{}/photo-1604537529428-15bcbeecfe4d", UNSPLASH),
                images: None,
            },
            about: About {
                title: "Om mig".to_string(),
                bio: "Med över 10 års erfarenhet inom fotografi specialiserar jag mig på att \
                      fånga autentiska ögonblick som berättar övertygande historier. Min metod \
                      kombinerar teknisk precision med kreativ vision för att skapa tidlösa bilder."
                    .to_string(),
                image: format!("{}/photo-1494790108377-be9c29b29330", UNSPLASH),
            },
            portfolio: vec![
                PortfolioItem {
                    id: 1,
                    title: "Sommarporträtt".to_string(),
                    category: "portraits".to_string(),
                    image: format!("{}/photo-1531746020798-e6953c6e8e04", UNSPLASH),
                },
                PortfolioItem {
                    id: 2,
                    title: "Bröllopsdag".to_string(),
                    category: "weddings".to_string(),
                    image: format!("{}/photo-1583939003579-730e3918a45a", UNSPLASH),
                },
            ],
            services: vec![
                ServiceItem {
                    id: 1,
                    title: "Bröllop".to_string(),
                    description: "Fånga de magiska ögonblicken på er stora dag.".to_string(),
                    icon: "wedding".to_string(),
                    price: Some("Från 12000 kr".to_string()),
                },
                ServiceItem {
                    id: 2,
                    title: "Porträtt".to_string(),
                    description: "Professionella porträtt för privatpersoner och företag."
                        .to_string(),
                    icon: "portrait".to_string(),
                    price: Some("1500 kr/timme".to_string()),
                },
                ServiceItem {
                    id: 3,
                    title: "Event".to_string(),
                    description: "Dokumentation av event, konserter och tillställningar."
                        .to_string(),
                    icon: "event".to_string(),
                    price: Some("Offert efter behov".to_string()),
                },
            ],
            testimonials: vec![
                TestimonialItem {
                    id: 1,
                    name: "Sara Johansson".to_string(),
                    role: "Brud".to_string(),
                    text: "Elena fångade vår bröllopsdag perfekt. Hon har ett otroligt öga för \
                           detaljer."
                        .to_string(),
                    avatar: format!("{}/photo-1531746020798-e6953c6e8e04", UNSPLASH),
                },
                TestimonialItem {
                    id: 2,
                    name: "Mikael Svensson".to_string(),
                    role: "Porträttkund".to_string(),
                    text: "Att arbeta med Elena var en fantastisk upplevelse. Hon har en unik \
                           förmåga att få dig att känna dig bekväm."
                        .to_string(),
                    avatar: format!("{}/photo-1583939003579-730e3918a45a", UNSPLASH),
                },
            ],
            contact: Contact {
                email: "elena@photography.com".to_string(),
                phone: "+46 70 123 45 67".to_string(),
                address: "Fotogatan 123, 111 22 Stockholm".to_string(),
                hours: "Måndag - Fredag: 9:00 - 18:00".to_string(),
            },
            site_name: "ANO Fotografi".to_string(),
            site_description:
                "Professionell fotograf specialiserad på porträtt, bröllop och evenemang"
                    .to_string(),
            menu_items: [
                ("home", "Hem"),
                ("about", "Om mig"),
                ("portfolio", "Portfolio"),
                ("services", "Tjänster"),
                ("testimonials", "Omdömen"),
                ("contact", "Kontakt"),
            ]
            .iter()
            .map(|(id, text)| MenuItem {
                id: id.to_string(),
                text: text.to_string(),
            })
            .collect(),
        }
    }
}
