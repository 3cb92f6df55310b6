//! Built-in domain lists, always available without any network access.

/// High-confidence disposable domains served before the remote feed loads.
pub const IMMEDIATE_BLOCKLIST: &[&str] = &[
    "10minutemail.com",
    "10minutemail.net",
    "20minutemail.com",
    "33mail.com",
    "anonbox.net",
    "discard.email",
    "dispostable.com",
    "emailondeck.com",
    "fakeinbox.com",
    "getairmail.com",
    "getnada.com",
    "guerrillamail.biz",
    "guerrillamail.com",
    "guerrillamail.de",
    "guerrillamail.info",
    "guerrillamail.net",
    "guerrillamail.org",
    "guerrillamailblock.com",
    "harakirimail.com",
    "incognitomail.org",
    "mailcatch.com",
    "maildrop.cc",
    "mailinator.com",
    "mailinator.net",
    "mailnesia.com",
    "mintemail.com",
    "mohmal.com",
    "mytemp.email",
    "sharklasers.com",
    "spam4.me",
    "spamgourmet.com",
    "temp-mail.io",
    "temp-mail.org",
    "tempail.com",
    "tempmail.com",
    "tempmail.net",
    "tempmailo.com",
    "tempr.email",
    "throwawaymail.com",
    "trashmail.com",
    "trashmail.de",
    "yopmail.com",
    "yopmail.fr",
    "yopmail.net",
];

/// Provider domains used when scraping yields too few results.
pub const STATIC_PROVIDER_DOMAINS: &[&str] = &[
    "1secmail.com",
    "1secmail.net",
    "1secmail.org",
    "bccto.me",
    "chacuo.net",
    "dropmail.me",
    "emailfake.com",
    "emltmp.com",
    "esiix.com",
    "fexbox.org",
    "fexpost.com",
    "grr.la",
    "guerrillamail.com",
    "inboxkitten.com",
    "kzccv.com",
    "laafd.com",
    "linshiyouxiang.net",
    "mail.tm",
    "mailpoof.com",
    "mailto.plus",
    "moakt.com",
    "nesopf.com",
    "osxofulk.com",
    "pokemail.net",
    "rteet.com",
    "spymail.one",
    "tempmail.plus",
    "tmail.ws",
    "tmpbox.net",
    "tmpmail.net",
    "tmpmail.org",
    "txcct.com",
    "vintomaper.com",
    "wuuvo.com",
    "xojxe.com",
    "yomail.info",
    "zeroe.ml",
];

/// Infrastructure domains that show up in scraped pages but are not mail
/// providers. Subdomains are excluded too.
pub const INFRA_DOMAINS: &[&str] = &[
    "amazonaws.com",
    "apple.com",
    "bing.com",
    "bootstrapcdn.com",
    "cloudflare.com",
    "cloudflare-dns.com",
    "cloudfront.net",
    "doubleclick.net",
    "example.com",
    "facebook.com",
    "facebook.net",
    "github.com",
    "githubusercontent.com",
    "gmail.com",
    "google-analytics.com",
    "google.com",
    "googleapis.com",
    "googlesyndication.com",
    "googletagmanager.com",
    "gstatic.com",
    "instagram.com",
    "jquery.com",
    "jsdelivr.net",
    "linkedin.com",
    "microsoft.com",
    "outlook.com",
    "schema.org",
    "twitter.com",
    "unpkg.com",
    "w3.org",
    "wordpress.org",
    "x.com",
    "yahoo.com",
    "youtube.com",
];

/// File extensions that look like TLDs in raw HTML.
pub const ASSET_SUFFIXES: &[&str] = &[
    "css", "gif", "htm", "html", "ico", "jpeg", "jpg", "js", "json", "map", "php", "png",
    "svg", "txt", "webp", "woff", "woff2", "xml",
];
