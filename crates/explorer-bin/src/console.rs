use explorer_core::Listing;
use storage_platform::notification::{Notifier, ToastLength};

/// Prints notifications to stderr so they never mix with command output
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, length: ToastLength) {
        match length {
            ToastLength::Short => eprintln!("» {}", message),
            ToastLength::Long => eprintln!("»» {}", message),
        }
    }
}

/// Text rendering of a listing: breadcrumb line, then one entry per line
pub fn render_listing(listing: &Listing) -> String {
    let crumb = &listing.breadcrumb;
    let up = if crumb.up.is_some() { "[..]" } else { "[  ]" };

    let trail = crumb
        .segments
        .iter()
        .map(|s| {
            if s.is_clickable {
                s.label.clone()
            } else {
                format!("<{}>", s.label)
            }
        })
        .collect::<Vec<_>>()
        .join(" / ");

    let mut out = format!("{} {}\n", up, trail);
    if listing.entries.is_empty() {
        out.push_str("  (empty)\n");
    }
    for entry in &listing.entries {
        if entry.is_directory {
            out.push_str(&format!("  {}/\n", entry.name));
        } else {
            out.push_str(&format!("  {}\n", entry.name));
        }
    }
    out
}
