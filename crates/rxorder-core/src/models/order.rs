//! Prescription order models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-side order status.
///
/// Transitions happen on the server; the client only uses the status for
/// display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Pending Verification")]
    PendingVerification,
    #[serde(rename = "Prescription Rejected")]
    PrescriptionRejected,
    #[serde(rename = "Price Quoted")]
    PriceQuoted,
    #[serde(rename = "Payment Awaiting")]
    PaymentAwaiting,
    #[serde(rename = "Preparing")]
    Preparing,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    #[serde(rename = "Delivered")]
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Completed,
        OrderStatus::PendingVerification,
        OrderStatus::PrescriptionRejected,
        OrderStatus::PriceQuoted,
        OrderStatus::PaymentAwaiting,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    /// Label used on the wire and in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Completed => "Completed",
            OrderStatus::PendingVerification => "Pending Verification",
            OrderStatus::PrescriptionRejected => "Prescription Rejected",
            OrderStatus::PriceQuoted => "Price Quoted",
            OrderStatus::PaymentAwaiting => "Payment Awaiting",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
        }
    }

    /// Parse a wire label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    /// Accent color (hex) for status bars and icons.
    pub fn color(&self) -> &'static str {
        match self {
            OrderStatus::Completed => "#34A853",
            OrderStatus::PendingVerification => "#FFA500",
            OrderStatus::PrescriptionRejected => "#D32F2F",
            OrderStatus::PriceQuoted => "#1976D2",
            OrderStatus::PaymentAwaiting => "#FF9800",
            OrderStatus::Preparing => "#0288D1",
            OrderStatus::OutForDelivery => "#7B1FA2",
            OrderStatus::Delivered => "#388E3C",
        }
    }

    /// Light background color (hex) for status badges.
    pub fn background_color(&self) -> &'static str {
        match self {
            OrderStatus::Completed | OrderStatus::Delivered => "#E8F5E8",
            OrderStatus::PendingVerification | OrderStatus::Preparing => "#FFF3E0",
            OrderStatus::PrescriptionRejected => "#FFEBEE",
            OrderStatus::PriceQuoted | OrderStatus::OutForDelivery => "#E3F2FD",
            OrderStatus::PaymentAwaiting => "#F3E5F5",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A prescription order as returned by the server.
///
/// The client holds read-only copies fetched per screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    #[serde(rename = "orderid", alias = "id", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "orderStatus", alias = "status")]
    pub status: OrderStatus,
    #[serde(rename = "orderDate", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "doctorName", default)]
    pub doctor_name: String,
    #[serde(rename = "patientName", default)]
    pub patient_name: String,
    #[serde(rename = "hospitalAddress", default)]
    pub hospital_address: String,
    #[serde(rename = "referralName", default, skip_serializing_if = "Option::is_none")]
    pub referral_name: Option<String>,
    #[serde(rename = "couponCode", default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(rename = "prescriptionUrls", default, deserialize_with = "one_or_many")]
    pub prescription_urls: Vec<String>,
}

impl Order {
    /// Identifier shown to the user, e.g. `ORD1042`.
    pub fn display_id(&self) -> String {
        format!("ORD{}", self.id)
    }

    /// Convert back into an editable draft (for the edit-order flow).
    pub fn to_draft(&self) -> OrderDraft {
        OrderDraft {
            doctor_name: self.doctor_name.clone(),
            patient_name: self.patient_name.clone(),
            hospital_address: self.hospital_address.clone(),
            referral_name: self.referral_name.clone(),
            coupon_code: self.coupon_code.clone(),
            prescription_urls: self.prescription_urls.clone(),
        }
    }
}

/// Payload for creating or updating an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub doctor_name: String,
    pub patient_name: String,
    pub hospital_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    pub prescription_urls: Vec<String>,
}

impl OrderDraft {
    /// Trim every field and drop blank optional fields and blank URLs.
    pub fn normalized(&self) -> Self {
        fn non_blank(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Self {
            doctor_name: self.doctor_name.trim().to_string(),
            patient_name: self.patient_name.trim().to_string(),
            hospital_address: self.hospital_address.trim().to_string(),
            referral_name: non_blank(&self.referral_name),
            coupon_code: non_blank(&self.coupon_code),
            prescription_urls: self
                .prescription_urls
                .iter()
                .map(|u| u.trim())
                .filter(|u| !u.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// One page of the order list.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(from = "OrderPageWire")]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// Total number of pages, when the server paginates
    pub pages: Option<u32>,
    /// Total number of orders, when the server reports it
    pub total: Option<u64>,
}

/// The list endpoint answers either with an envelope or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum OrderPageWire {
    Bare(Vec<Order>),
    Envelope {
        #[serde(default)]
        data: Vec<Order>,
        #[serde(default)]
        pages: Option<u32>,
        #[serde(default)]
        total: Option<u64>,
    },
}

impl From<OrderPageWire> for OrderPage {
    fn from(wire: OrderPageWire) -> Self {
        match wire {
            OrderPageWire::Bare(orders) => Self {
                orders,
                pages: None,
                total: None,
            },
            OrderPageWire::Envelope { data, pages, total } => Self {
                orders: data,
                pages,
                total,
            },
        }
    }
}

pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Urls {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Urls>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Urls::One(url)) => vec![url],
        Some(Urls::Many(urls)) => urls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER_JSON: &str = r#"{
        "orderid": 1042,
        "orderStatus": "Out for Delivery",
        "orderDate": "2025-06-01T10:30:00Z",
        "doctorName": "Dr. Mehta",
        "patientName": "Asha Rao",
        "hospitalAddress": "12 MG Road",
        "prescriptionUrls": "https://cdn.example.com/rx/1.jpg"
    }"#;

    #[test]
    fn test_order_from_server_json() {
        let order: Order = serde_json::from_str(ORDER_JSON).unwrap();
        assert_eq!(order.id, "1042");
        assert_eq!(order.display_id(), "ORD1042");
        assert_eq!(order.status, OrderStatus::OutForDelivery);
        assert_eq!(order.prescription_urls, vec!["https://cdn.example.com/rx/1.jpg"]);
        assert!(order.referral_name.is_none());
    }

    #[test]
    fn test_order_accepts_alternate_field_names() {
        let order: Order = serde_json::from_str(
            r#"{"id":"a1","status":"Delivered","createdAt":"2025-01-02T00:00:00Z",
                "prescriptionUrls":["u1","u2"]}"#,
        )
        .unwrap();
        assert_eq!(order.id, "a1");
        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.prescription_urls.len(), 2);
        assert!(order.doctor_name.is_empty());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result: Result<Order, _> = serde_json::from_str(
            r#"{"orderid":"1","orderStatus":"Lost","orderDate":"2025-01-02T00:00:00Z"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_status_labels_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_label(status.label()), Some(status));
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.label()));
        }
        assert_eq!(OrderStatus::from_label("pending"), None);
    }

    #[test]
    fn test_page_from_envelope() {
        let json = format!(r#"{{"data":[{}],"pages":3,"total":25}}"#, ORDER_JSON);
        let page: OrderPage = serde_json::from_str(&json).unwrap();
        assert_eq!(page.orders.len(), 1);
        assert_eq!(page.pages, Some(3));
        assert_eq!(page.total, Some(25));
    }

    #[test]
    fn test_page_from_bare_array() {
        let json = format!("[{},{}]", ORDER_JSON, ORDER_JSON);
        let page: OrderPage = serde_json::from_str(&json).unwrap();
        assert_eq!(page.orders.len(), 2);
        assert_eq!(page.pages, None);
        assert_eq!(page.total, None);
    }

    #[test]
    fn test_draft_omits_absent_optionals() {
        let draft = OrderDraft {
            doctor_name: "Dr. Mehta".into(),
            patient_name: "Asha".into(),
            hospital_address: "12 MG Road".into(),
            referral_name: None,
            coupon_code: Some("WELCOME20".into()),
            prescription_urls: vec!["file:///rx.jpg".into()],
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["doctorName"], "Dr. Mehta");
        assert_eq!(json["couponCode"], "WELCOME20");
        assert!(json.get("referralName").is_none());
    }

    #[test]
    fn test_draft_normalized() {
        let draft = OrderDraft {
            doctor_name: "  Dr. Mehta ".into(),
            patient_name: "Asha\n".into(),
            hospital_address: " 12 MG Road".into(),
            referral_name: Some("   ".into()),
            coupon_code: Some(" SAVE10 ".into()),
            prescription_urls: vec![" a.jpg ".into(), "".into()],
        };
        let normalized = draft.normalized();
        assert_eq!(normalized.doctor_name, "Dr. Mehta");
        assert_eq!(normalized.patient_name, "Asha");
        assert_eq!(normalized.referral_name, None);
        assert_eq!(normalized.coupon_code.as_deref(), Some("SAVE10"));
        assert_eq!(normalized.prescription_urls, vec!["a.jpg"]);
    }

    #[test]
    fn test_order_to_draft() {
        let order: Order = serde_json::from_str(ORDER_JSON).unwrap();
        let draft = order.to_draft();
        assert_eq!(draft.doctor_name, "Dr. Mehta");
        assert_eq!(draft.prescription_urls, order.prescription_urls);
    }
}
