//! Built-in lookup tables: categories, brands, retail domains
//!
//! Everything here is immutable reference data consumed by the query,
//! classification, filtering and ranking stages.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::models::Category;

/// Hard bounds and sweet spot of a category's prices, in rupees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBand {
    pub min: f64,
    pub max: f64,
    pub optimal: f64,
}

/// Everything the pipeline knows about one product category
#[derive(Debug)]
pub struct CategoryProfile {
    pub category: Category,
    /// Free-text description used by the zero-shot proxy
    pub description: &'static str,
    pub keywords: &'static [&'static str],
    pub brands: &'static [&'static str],
    /// Brand → product-line phrases, e.g. samsung → "galaxy s"
    pub model_patterns: &'static [(&'static str, &'static [&'static str])],
    /// Plausible budget window for the feature-based classifier
    pub budget_window: (f64, f64),
    pub features: &'static [&'static str],
    pub semantic_primary: &'static [&'static str],
    pub semantic_secondary: &'static [&'static str],
    /// Words that belong to other categories
    pub exclusion: &'static [&'static str],
    /// Words a listing in this category is expected to contain
    pub inclusion: &'static [&'static str],
    pub specifications: &'static [&'static str],
    pub image_hints: &'static [&'static str],
    pub price_band: PriceBand,
}

impl CategoryProfile {
    /// Phrases registered for `brand` in this category
    pub fn patterns_for(&self, brand: &str) -> &'static [&'static str] {
        self.model_patterns
            .iter()
            .find(|(b, _)| *b == brand)
            .map_or(&[], |(_, patterns)| *patterns)
    }
}

static MOBILE_PHONES: CategoryProfile = CategoryProfile {
    category: Category::MobilePhones,
    description: "smartphones mobile phones cell phones handheld devices with calling and internet capabilities",
    keywords: &[
        "phone", "smartphone", "mobile", "cell", "galaxy", "iphone", "pixel", "oneplus", "xiaomi",
        "oppo", "vivo", "redmi", "5g",
    ],
    brands: &[
        "samsung", "apple", "google", "oneplus", "xiaomi", "oppo", "vivo", "realme", "nokia",
        "motorola",
    ],
    model_patterns: &[
        ("samsung", &["galaxy s", "galaxy note", "galaxy a", "galaxy m", "galaxy z", "galaxy f"]),
        ("apple", &["iphone"]),
        ("google", &["pixel"]),
        ("oneplus", &["oneplus", "nord"]),
        ("xiaomi", &["mi", "redmi", "poco"]),
        ("oppo", &["find x", "reno"]),
        ("vivo", &["vivo x", "vivo v", "vivo y"]),
        ("realme", &["narzo", "realme gt"]),
        ("motorola", &["moto g", "edge", "razr"]),
    ],
    budget_window: (5000.0, 150000.0),
    features: &["camera", "battery", "screen", "processor", "storage", "ram", "5g"],
    semantic_primary: &["smartphone", "mobile", "phone", "cell", "galaxy", "iphone", "pixel"],
    semantic_secondary: &["camera", "battery", "display", "screen", "processor", "ram", "storage"],
    exclusion: &[
        "washing", "refrigerator", "tv", "television", "laptop", "desktop", "tablet",
    ],
    inclusion: &[
        "phone", "smartphone", "mobile", "galaxy", "iphone", "pixel", "oneplus", "5g", "ram",
        "storage",
    ],
    specifications: &[
        "camera", "battery", "display", "processor", "ram", "storage", "mah", "mp", "5g", "gb",
    ],
    image_hints: &["phone", "mobile", "smartphone", "galaxy", "iphone", "pixel"],
    price_band: PriceBand {
        min: 5000.0,
        max: 150000.0,
        optimal: 25000.0,
    },
};

static HOME_APPLIANCES: CategoryProfile = CategoryProfile {
    category: Category::HomeAppliances,
    description: "household appliances for daily use like washing machines refrigerators microwaves dishwashers",
    keywords: &[
        "washing machine", "washer", "front load", "top load", "refrigerator", "fridge", "freezer",
        "microwave", "dishwasher", "dryer", "oven", "stove", "ac", "air conditioner",
        "water purifier", "vacuum cleaner", "geyser", "chimney",
    ],
    brands: &["samsung", "lg", "whirlpool", "bosch", "haier", "godrej", "voltas"],
    model_patterns: &[
        ("samsung", &["ecobubble", "addwash", "quickdrive"]),
        ("lg", &["twinwash", "inverter", "side by side"]),
        ("whirlpool", &["intellisense", "steam care"]),
    ],
    budget_window: (5000.0, 100000.0),
    features: &["capacity", "energy rating", "wash programs", "cooling system"],
    semantic_primary: &["washing", "refrigerator", "microwave", "dishwasher", "dryer", "oven"],
    semantic_secondary: &["capacity", "energy", "efficiency", "cycle", "temperature"],
    exclusion: &[
        "phone", "smartphone", "mobile", "galaxy", "iphone", "pixel", "laptop", "computer", "tablet",
    ],
    inclusion: &[
        "washing", "washer", "front load", "top load", "refrigerator", "fridge", "freezer",
        "microwave", "dishwasher", "dryer", "oven", "ac", "air conditioner", "water purifier",
        "vacuum cleaner", "geyser", "chimney",
    ],
    specifications: &[
        "capacity", "energy", "efficiency", "cycle", "temperature", "kg", "liters", "litres",
    ],
    image_hints: &["washing", "machine", "fridge", "refrigerator", "appliance", "microwave"],
    price_band: PriceBand {
        min: 2000.0,
        max: 100000.0,
        optimal: 15000.0,
    },
};

static ELECTRONICS: CategoryProfile = CategoryProfile {
    category: Category::Electronics,
    description: "electronic devices like televisions monitors speakers headphones cameras gaming consoles",
    keywords: &[
        "tv", "television", "monitor", "speaker", "headphone", "earbud", "camera", "gaming",
        "console", "soundbar",
    ],
    brands: &["samsung", "lg", "sony", "bose", "jbl", "canon", "nikon"],
    model_patterns: &[
        ("samsung", &["qled", "oled", "crystal uhd"]),
        ("lg", &["oled", "nano cell", "webos"]),
        ("sony", &["bravia", "xperia", "playstation"]),
    ],
    budget_window: (1000.0, 200000.0),
    features: &["screen size", "resolution", "audio quality", "connectivity"],
    semantic_primary: &["tv", "television", "monitor", "speaker", "headphone", "earbud"],
    semantic_secondary: &["screen", "display", "audio", "sound", "resolution", "inch"],
    exclusion: &["phone", "smartphone", "washing", "refrigerator", "laptop"],
    inclusion: &[
        "tv", "television", "monitor", "speaker", "headphone", "earbud", "soundbar", "camera",
    ],
    specifications: &["screen", "display", "audio", "sound", "resolution", "inch", "hz", "4k"],
    image_hints: &["tv", "television", "speaker", "headphone", "monitor", "camera"],
    price_band: PriceBand {
        min: 1000.0,
        max: 50000.0,
        optimal: 8000.0,
    },
};

static COMPUTERS: CategoryProfile = CategoryProfile {
    category: Category::Computers,
    description: "computing devices like laptops desktops tablets computers for work and personal use",
    keywords: &[
        "laptop", "desktop", "tablet", "computer", "pc", "macbook", "chromebook", "notebook",
    ],
    brands: &["apple", "dell", "hp", "lenovo", "asus", "acer", "samsung"],
    model_patterns: &[
        ("apple", &["macbook air", "macbook pro", "imac", "mac mini", "ipad"]),
        ("dell", &["inspiron", "xps", "latitude", "vostro"]),
        ("hp", &["pavilion", "envy", "spectre", "omen", "victus"]),
        ("lenovo", &["thinkpad", "ideapad", "legion", "yoga"]),
        ("asus", &["zenbook", "vivobook", "rog", "tuf"]),
        ("acer", &["aspire", "nitro", "predator", "swift"]),
    ],
    budget_window: (15000.0, 300000.0),
    features: &["processor", "ram", "storage", "graphics", "display"],
    semantic_primary: &["laptop", "desktop", "computer", "notebook", "macbook", "pc"],
    semantic_secondary: &["processor", "ram", "ssd", "graphics", "display", "intel", "ryzen"],
    exclusion: &["washing", "refrigerator", "smartphone", "television"],
    inclusion: &[
        "laptop", "desktop", "computer", "notebook", "macbook", "chromebook", "pc", "tablet",
    ],
    specifications: &["processor", "ram", "ssd", "graphics", "display", "intel", "ryzen", "gb"],
    image_hints: &["laptop", "notebook", "macbook", "computer", "desktop"],
    price_band: PriceBand {
        min: 15000.0,
        max: 300000.0,
        optimal: 60000.0,
    },
};

/// Lookup table for a category
pub fn profile(category: Category) -> &'static CategoryProfile {
    match category {
        Category::MobilePhones => &MOBILE_PHONES,
        Category::HomeAppliances => &HOME_APPLIANCES,
        Category::Electronics => &ELECTRONICS,
        Category::Computers => &COMPUTERS,
    }
}

/// All category profiles in declaration order
pub fn profiles() -> impl Iterator<Item = &'static CategoryProfile> {
    Category::ALL.into_iter().map(profile)
}

/// A brand with its aliases and product lines
#[derive(Debug)]
pub struct BrandProfile {
    pub name: &'static str,
    /// Words that imply the brand on their own, e.g. "iphone"
    pub aliases: &'static [&'static str],
    /// Product lines, longest first so "macbook air" wins over "macbook"
    pub series: &'static [&'static str],
}

pub static BRANDS: &[BrandProfile] = &[
    BrandProfile { name: "samsung", aliases: &["galaxy"], series: &["galaxy"] },
    BrandProfile {
        name: "apple",
        aliases: &["iphone", "ipad", "macbook", "airpods", "imac"],
        series: &["macbook air", "macbook pro", "iphone", "ipad", "macbook", "airpods", "imac", "watch"],
    },
    BrandProfile { name: "google", aliases: &["pixel"], series: &["pixel"] },
    BrandProfile { name: "oneplus", aliases: &["nord"], series: &["nord"] },
    BrandProfile {
        name: "xiaomi",
        aliases: &["redmi", "poco", "mi"],
        series: &["redmi note", "redmi", "poco", "mi"],
    },
    BrandProfile { name: "oppo", aliases: &[], series: &["find x", "reno"] },
    BrandProfile { name: "vivo", aliases: &[], series: &[] },
    BrandProfile { name: "realme", aliases: &["narzo"], series: &["narzo", "gt"] },
    BrandProfile { name: "nokia", aliases: &[], series: &[] },
    BrandProfile { name: "motorola", aliases: &["moto"], series: &["moto g", "moto", "edge", "razr"] },
    BrandProfile { name: "sony", aliases: &["bravia", "playstation"], series: &["bravia", "xperia", "wh"] },
    BrandProfile { name: "lg", aliases: &[], series: &[] },
    BrandProfile { name: "bose", aliases: &[], series: &["quietcomfort"] },
    BrandProfile { name: "jbl", aliases: &[], series: &["flip", "charge", "tune"] },
    BrandProfile { name: "canon", aliases: &[], series: &["eos"] },
    BrandProfile { name: "nikon", aliases: &[], series: &["coolpix"] },
    BrandProfile { name: "whirlpool", aliases: &[], series: &[] },
    BrandProfile { name: "bosch", aliases: &[], series: &["series"] },
    BrandProfile { name: "haier", aliases: &[], series: &[] },
    BrandProfile { name: "godrej", aliases: &[], series: &[] },
    BrandProfile { name: "voltas", aliases: &[], series: &[] },
    BrandProfile { name: "dell", aliases: &[], series: &["inspiron", "xps", "latitude", "vostro"] },
    BrandProfile { name: "hp", aliases: &[], series: &["pavilion", "envy", "spectre", "omen", "victus"] },
    BrandProfile { name: "lenovo", aliases: &["thinkpad"], series: &["thinkpad", "ideapad", "legion", "yoga"] },
    BrandProfile { name: "asus", aliases: &[], series: &["zenbook", "vivobook", "rog", "tuf"] },
    BrandProfile { name: "acer", aliases: &[], series: &["aspire", "nitro", "predator", "swift"] },
];

pub fn brand(name: &str) -> Option<&'static BrandProfile> {
    BRANDS.iter().find(|b| b.name == name)
}

/// Known misspellings, matched as whole words
pub static MISSPELLINGS: &[(&str, &str)] = &[
    ("samsun", "samsung"),
    ("samsang", "samsung"),
    ("samung", "samsung"),
    ("iphon", "iphone"),
    ("ipone", "iphone"),
    ("aple", "apple"),
    ("one plus", "oneplus"),
    ("xiomi", "xiaomi"),
    ("xaomi", "xiaomi"),
    ("motorolla", "motorola"),
    ("labtop", "laptop"),
    ("lapto", "laptop"),
    ("moble", "mobile"),
    ("mobil", "mobile"),
    ("smartfone", "smartphone"),
    ("refrigirator", "refrigerator"),
    ("refridgerator", "refrigerator"),
    ("washing machin", "washing machine"),
    ("telivision", "television"),
    ("headfone", "headphone"),
];

/// Plural product nouns and their singular form
pub static PLURALS: &[(&str, &str)] = &[
    ("smartphones", "smartphone"),
    ("phones", "phone"),
    ("mobiles", "mobile"),
    ("laptops", "laptop"),
    ("tablets", "tablet"),
    ("computers", "computer"),
    ("desktops", "desktop"),
    ("headphones", "headphone"),
    ("earphones", "earphone"),
    ("earbuds", "earbud"),
    ("speakers", "speaker"),
    ("televisions", "television"),
    ("tvs", "tv"),
    ("monitors", "monitor"),
    ("cameras", "camera"),
    ("watches", "watch"),
    ("refrigerators", "refrigerator"),
    ("fridges", "fridge"),
    ("microwaves", "microwave"),
    ("dishwashers", "dishwasher"),
    ("machines", "machine"),
    ("ovens", "oven"),
];

/// Synonyms appended to the expanded query variant
pub static SYNONYMS: &[(&str, &[&str])] = &[
    ("phone", &["mobile", "smartphone"]),
    ("mobile", &["phone", "smartphone"]),
    ("smartphone", &["phone", "mobile"]),
    ("laptop", &["notebook"]),
    ("tv", &["television"]),
    ("television", &["tv"]),
    ("refrigerator", &["fridge"]),
    ("fridge", &["refrigerator"]),
    ("headphone", &["headset", "earphone"]),
    ("washing machine", &["washer"]),
    ("cheap", &["affordable", "budget"]),
];

/// Colour vocabulary, multi-word entries first
pub static COLORS: &[&str] = &[
    "titanium silverblue",
    "titanium black",
    "titanium gray",
    "titanium grey",
    "natural titanium",
    "phantom black",
    "midnight black",
    "space gray",
    "space grey",
    "rose gold",
    "sierra blue",
    "light blue",
    "dark blue",
    "jet black",
    "black",
    "white",
    "blue",
    "red",
    "green",
    "yellow",
    "pink",
    "purple",
    "violet",
    "gold",
    "silver",
    "gray",
    "grey",
    "graphite",
    "midnight",
    "starlight",
    "cream",
    "lavender",
    "mint",
    "orange",
    "bronze",
];

/// Words appended as exclusions to the exact-match variant
pub static ACCESSORY_EXCLUSIONS: &[&str] = &[
    "case", "cover", "charger", "cable", "protector", "skin", "adapter",
];

/// Words marking a listing as an accessory rather than a device
pub static ACCESSORY_KEYWORDS: &[&str] = &[
    "case", "cover", "protector", "screen guard", "tempered glass", "charger", "cable", "adapter",
    "stand", "holder", "mount", "accessory", "accessories", "spare", "replacement", "parts",
    "back cover", "bumper", "skin", "sticker", "power bank", "earphone", "headphone",
    "bluetooth", "speaker", "dock", "keyboard", "mouse", "stylus", "remote", "controller",
];

pub static BUY_KEYWORDS: &[&str] = &[
    "buy now", "add to cart", "add to bag", "shop now", "purchase", "order now", "checkout",
    "buy", "shop", "order", "cart",
];

pub static AVAILABILITY_KEYWORDS: &[&str] = &[
    "in stock", "available", "ready to ship", "fast delivery", "free delivery",
    "express delivery", "ships in", "delivery by",
];

pub static OUT_OF_STOCK_KEYWORDS: &[&str] = &[
    "out of stock", "sold out", "currently unavailable", "coming soon", "notify me",
];

pub static INFORMATIONAL_KEYWORDS: &[&str] = &[
    "specifications", "technical details", "about this product", "product information",
    "tech specs", "specs", "technical specifications", "product overview", "learn more",
    "compare", "review", "guide", "manual", "download", "firmware",
];

pub static INFORMATIONAL_URL_SEGMENTS: &[&str] = &[
    "spec", "specs", "specification", "specifications", "support", "help", "about", "news",
    "blog", "tech", "compare", "review", "reviews", "guide", "manual", "download", "firmware",
    "software",
];

pub static ECOMMERCE_URL_SEGMENTS: &[&str] = &[
    "p", "product", "products", "item", "buy", "shop", "dp", "product-details",
];

/// Words describing a standalone device, used to exempt it from the accessory penalty
pub static PRODUCT_TYPE_NOUNS: &[&str] = &[
    "smartphone", "phone", "mobile", "laptop", "tablet", "watch", "earbud", "headphone",
    "speaker", "camera", "tv", "television", "refrigerator", "washing machine", "monitor",
];

/// Shopping domains that always pass the domain gate
pub static SHOPPING_DOMAINS: &[&str] = &[
    "flipkart.com", "amazon.in", "snapdeal.com", "paytmmall.com", "myntra.com", "ajio.com",
    "nykaa.com", "croma.com", "tatacliq.com", "shopclues.com", "vijaysales.com",
    "sangeethamobiles.com", "poorvika.com", "reliancedigital.in", "reliance-digital.com",
    "indiamart.com", "olx.in", "quikr.com", "pepperfry.com", "urbanladder.com",
    "amazon.com", "ebay.com", "walmart.com", "target.com", "bestbuy.com", "apple.com",
    "samsung.com", "google.com", "mi.com", "oneplus.in", "oppo.com", "vivo.com",
    "realme.com", "nokia.com", "motorola.com", "pricebaba.com", "mysmartprice.com",
    "gadgets360.com",
];

/// Non-shopping domains. Entries without a dot match anywhere in the host.
pub static BLOCKED_DOMAINS: &[&str] = &[
    "blog", "news", "article", "review", "forum", "community", "reddit.com", "quora.com",
    "stackoverflow.com", "github.com", "medium.com", "wordpress.com", "blogspot.com",
    "tumblr.com", "youtube.com", "facebook.com", "twitter.com", "x.com", "instagram.com",
    "linkedin.com", "pinterest.com", "tiktok.com", "wikipedia.org",
];

/// Manufacturer sites; without a price they are treated as informational
pub static BRAND_DOMAINS: &[&str] = &[
    "apple.com", "samsung.com", "google.com", "oneplus.com", "oneplus.in", "mi.com", "oppo.com",
    "vivo.com", "realme.com", "nokia.com", "motorola.com", "sony.com", "lg.com", "xiaomi.com",
];

/// Retailers serving the default region
pub static REGIONAL_RETAILERS: &[&str] = &[
    "flipkart.com", "amazon.in", "snapdeal.com", "croma.com", "reliancedigital.in",
    "paytmmall.com", "tatacliq.com", "vijaysales.com", "shopclues.com", "myntra.com",
];

lazy_static! {
    /// Seller reputation in [0, 1]
    pub static ref SELLER_REPUTATION: HashMap<&'static str, f64> = {
        let mut m = HashMap::new();
        m.insert("flipkart.com", 0.95);
        m.insert("amazon.in", 0.98);
        m.insert("snapdeal.com", 0.85);
        m.insert("croma.com", 0.90);
        m.insert("reliancedigital.in", 0.88);
        m.insert("paytmmall.com", 0.82);
        m.insert("tatacliq.com", 0.87);
        m.insert("vijaysales.com", 0.85);
        m.insert("shopclues.com", 0.75);
        m.insert("myntra.com", 0.80);
        m
    };
}

/// True when `domain` equals `entry` or is a subdomain of it
pub fn domain_matches(domain: &str, entry: &str) -> bool {
    domain == entry
        || domain
            .strip_suffix(entry)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Lookup against a domain list; entries without a dot are substring markers
pub fn domain_in(domain: &str, list: &[&str]) -> bool {
    list.iter().any(|entry| {
        if entry.contains('.') {
            domain_matches(domain, entry)
        } else {
            domain.contains(entry)
        }
    })
}
