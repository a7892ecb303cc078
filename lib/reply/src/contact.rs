//! Contact card for the agencies that handle protected species.

use crate::message::{Button, GenericTemplate, MessageSegment, TemplateElement};

/// An organization listed on the contact card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Agency {
    pub name: &'static str,
    pub website: &'static str,
    pub phone: &'static str,
}

/// Agencies shown by `$contactAgency`, in card order.
pub const AGENCIES: [Agency; 3] = [
    Agency {
        name: "Endemic Species Research Institute",
        website: "https://www.tesri.gov.tw",
        phone: "+886492761331",
    },
    Agency {
        name: "Academia Sinica Biodiversity Research Center",
        website: "https://www.biodiv.tw",
        phone: "+886227822120",
    },
    Agency {
        name: "NTU Institute of Oceanography",
        website: "https://www.oc.ntu.edu.tw",
        phone: "+886233663366",
    },
];

impl Agency {
    fn element(&self) -> TemplateElement {
        TemplateElement {
            title: self.name.to_string(),
            subtitle: None,
            buttons: vec![
                Button::WebUrl {
                    title: "Website".to_string(),
                    url: self.website.to_string(),
                },
                Button::PhoneNumber {
                    title: "Call".to_string(),
                    payload: self.phone.to_string(),
                },
            ],
        }
    }
}

/// Builds the contact card template.
#[must_use]
pub fn agency_card() -> GenericTemplate {
    GenericTemplate {
        elements: AGENCIES.iter().map(Agency::element).collect(),
    }
}

/// Builds the contact card as a standalone message.
#[must_use]
pub fn agency_card_segment() -> MessageSegment {
    MessageSegment::template(agency_card())
}
