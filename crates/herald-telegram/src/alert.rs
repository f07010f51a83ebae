use serde::Deserialize;

use crate::send::escape_html;

/// Which admin alert to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    NewBooking,
    TicketIssued,
}

/// Booking details shown in an admin alert. Everything except the reference
/// is optional; missing lines are left out.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingAlert {
    pub booking_reference: String,
    #[serde(default)]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub departure_date: Option<String>,
    #[serde(default)]
    pub passenger_count: Option<u32>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub eticket_numbers: Vec<String>,
    #[serde(default)]
    pub airline_record_locator: Option<String>,
}

impl BookingAlert {
    /// Render the HTML message. `dashboard_url`, when set, adds a link to
    /// `{dashboard_url}/admin/bookings/{booking_id}`.
    pub fn render(&self, kind: AlertKind, dashboard_url: Option<&str>) -> String {
        let header = match kind {
            AlertKind::NewBooking => "🎫 <b>NEW BOOKING ALERT</b>",
            AlertKind::TicketIssued => "✈️ <b>TICKET ISSUED</b>",
        };
        let mut lines = vec![header.to_string(), String::new()];

        if let Some(status) = &self.status {
            lines.push(format!(
                "{} <b>Status:</b> {}",
                status_emoji(status),
                escape_html(&status.replace('_', " ").to_uppercase())
            ));
        }
        lines.push(format!(
            "📋 <b>Reference:</b> <code>{}</code>",
            escape_html(&self.booking_reference)
        ));

        let mut push = |label: &str, value: Option<String>| {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                lines.push(format!("{label} {}", escape_html(&v)));
            }
        };
        push("👤 <b>Customer:</b>", self.customer_name.clone());
        push("📧 <b>Email:</b>", self.customer_email.clone());
        push("📞 <b>Phone:</b>", self.customer_phone.clone());
        push("✈️ <b>Route:</b>", self.route.clone());
        push("📅 <b>Date:</b>", self.departure_date.clone());
        push("👥 <b>Passengers:</b>", self.passenger_count.map(|n| n.to_string()));
        push(
            "💰 <b>Total:</b>",
            self.total_amount.map(|amount| {
                let currency = self.currency.as_deref().unwrap_or("");
                format!("{currency} {amount:.2}").trim().to_string()
            }),
        );
        if !self.eticket_numbers.is_empty() {
            push("🎫 <b>E-Tickets:</b>", Some(self.eticket_numbers.join(", ")));
        }
        push("✈️ <b>PNR:</b>", self.airline_record_locator.clone());

        if let (Some(base), Some(id)) = (dashboard_url, self.booking_id.as_deref()) {
            lines.push(String::new());
            lines.push(format!(
                "🔗 <a href=\"{}/admin/bookings/{}\">View in Dashboard</a>",
                escape_html(base.trim_end_matches('/')),
                escape_html(id)
            ));
        }
        lines.join("\n")
    }
}

fn status_emoji(status: &str) -> &'static str {
    match status {
        "pending_ticketing" => "🟡",
        "ticketed" => "✅",
        "confirmed" => "🟢",
        "cancelled" => "❌",
        _ => "📋",
    }
}
