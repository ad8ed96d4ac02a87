use estate_types::models::{Buyer, Seller};

/// Samples shown per lead kind in the summary reply.
pub const SUMMARY_SAMPLES: usize = 3;

/// Which lead lists a property question asks for by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadMentions {
    pub buyers: bool,
    pub sellers: bool,
}

impl LeadMentions {
    pub fn from_message(message: &str) -> Self {
        let text = message.to_lowercase();
        Self {
            buyers: text.contains("buyer"),
            sellers: text.contains("seller"),
        }
    }

    pub fn any(&self) -> bool {
        self.buyers || self.sellers
    }
}

pub fn buyer_block(buyer: &Buyer) -> String {
    format!(
        "Name: {}\nBudget: {}\nLocation: {}\nType: {}\nContact: {}",
        buyer.name,
        buyer.budget,
        or_na(&buyer.location),
        or_na(&buyer.property_type),
        or_na(&buyer.contact),
    )
}

pub fn seller_block(seller: &Seller) -> String {
    format!(
        "Name: {}\nPrice: {}\nLocation: {}\nType: {}\nContact: {}",
        seller.name,
        or_na(&seller.price),
        or_na(&seller.location),
        seller.property_type,
        or_na(&seller.contact),
    )
}

pub fn list_buyers(buyers: &[Buyer]) -> String {
    if buyers.is_empty() {
        return "No buyers are registered yet.".to_string();
    }
    let blocks: Vec<String> = buyers.iter().map(buyer_block).collect();
    format!("Here are all {} buyers:\n\n{}", buyers.len(), blocks.join("\n\n"))
}

pub fn list_sellers(sellers: &[Seller]) -> String {
    if sellers.is_empty() {
        return "No sellers are registered yet.".to_string();
    }
    let blocks: Vec<String> = sellers.iter().map(seller_block).collect();
    format!("Here are all {} sellers:\n\n{}", sellers.len(), blocks.join("\n\n"))
}

/// Counts plus a few one-line samples of each lead kind.
pub fn summary(buyers: &[Buyer], sellers: &[Seller]) -> String {
    let mut out = format!(
        "Active Buyers: {}\nActive Sellers: {}",
        buyers.len(),
        sellers.len()
    );

    if !buyers.is_empty() {
        out.push_str("\n\nSample buyers:");
        for b in buyers.iter().take(SUMMARY_SAMPLES) {
            out.push_str(&format!(
                "\n- {} (budget {}, {}, {})",
                b.name,
                b.budget,
                or_na(&b.location),
                or_na(&b.property_type)
            ));
        }
    }

    if !sellers.is_empty() {
        out.push_str("\n\nSample sellers:");
        for s in sellers.iter().take(SUMMARY_SAMPLES) {
            out.push_str(&format!(
                "\n- {} (price {}, {}, {})",
                s.name,
                or_na(&s.price),
                or_na(&s.location),
                s.property_type
            ));
        }
    }

    out.push_str("\n\nAsk me about buyers or sellers to see full details.");
    out
}

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().filter(|v| !v.is_empty()).unwrap_or("N/A")
}
