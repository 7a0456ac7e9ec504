use std::collections::BTreeMap;
use std::fmt::Write;

use crate::domain::order::{OrderEvent, OrderEventTag, OrderView};

/// Subject and bodies for one email
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

fn headline(tag: OrderEventTag, order_number: &str) -> (String, &'static str) {
    match tag {
        OrderEventTag::Created => (
            format!("We received your order {order_number}"),
            "Thanks for your purchase. We will let you know as soon as your payment is confirmed.",
        ),
        OrderEventTag::PaymentConfirmed => (
            format!("Payment confirmed for order {order_number}"),
            "Your payment has been confirmed and we are preparing your order.",
        ),
        OrderEventTag::ReadyForPickup => (
            format!("Order {order_number} is ready for pickup"),
            "Your order is packed and ready to be picked up.",
        ),
        OrderEventTag::Shipped => (
            format!("Order {order_number} is on its way"),
            "Your order has left our store and is on its way to you.",
        ),
        OrderEventTag::Delivered => (
            format!("Order {order_number} was delivered"),
            "Your order has been delivered. Enjoy it!",
        ),
    }
}

pub fn render_email(event: &OrderEvent) -> RenderedEmail {
    let view = &event.view;
    let (subject, lead) = headline(event.tag, &view.order_number);

    RenderedEmail {
        html: render_html(view, &subject, lead),
        text: render_text(view, lead),
        subject,
    }
}

fn render_text(view: &OrderView, lead: &str) -> String {
    let mut text = format!("Hi {},\n\n{}\n\nOrder {}\n", view.customer_name, lead, view.order_number);

    for line in &view.lines {
        let _ = writeln!(
            text,
            "  {} x {} @ {} = {}",
            line.quantity, line.product_name, line.unit_price, line.subtotal
        );
    }
    let _ = writeln!(text, "Total: {}", view.total);

    if let Some(delivery) = &view.delivery {
        let _ = writeln!(
            text,
            "Delivery: {} ({}), {}",
            delivery.method, delivery.zone, delivery.schedule
        );
    }

    text
}

fn render_html(view: &OrderView, title: &str, lead: &str) -> String {
    let mut rows = String::new();
    for line in &view.lines {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&line.product_name),
            line.quantity,
            line.unit_price,
            line.subtotal
        );
    }

    let delivery = view
        .delivery
        .as_ref()
        .map(|d| {
            format!(
                "<p>Delivery: {} ({}), {}</p>",
                escape_html(&d.method),
                escape_html(&d.zone),
                escape_html(&d.schedule)
            )
        })
        .unwrap_or_default();

    format!(
        "<h2>{}</h2><p>Hi {},</p><p>{}</p>\
         <table><tr><th>Product</th><th>Qty</th><th>Price</th><th>Subtotal</th></tr>{}</table>\
         <p><strong>Total: {}</strong></p>{}",
        escape_html(title),
        escape_html(&view.customer_name),
        lead,
        rows,
        view.total,
        delivery
    )
}

/// Positional variables for provider-side templates
pub fn template_variables(view: &OrderView) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("1".to_string(), view.customer_name.clone()),
        ("2".to_string(), view.order_number.clone()),
        ("3".to_string(), view.total.to_string()),
    ])
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_view;

    #[test]
    fn test_each_tag_has_distinct_subject() {
        let tags = [
            OrderEventTag::Created,
            OrderEventTag::PaymentConfirmed,
            OrderEventTag::ReadyForPickup,
            OrderEventTag::Shipped,
            OrderEventTag::Delivered,
        ];
        let subjects: std::collections::HashSet<_> = tags
            .into_iter()
            .map(|tag| render_email(&OrderEvent::new(tag, sample_view())).subject)
            .collect();
        assert_eq!(subjects.len(), 5);
    }

    #[test]
    fn test_body_lists_lines_and_total() {
        let email = render_email(&OrderEvent::new(OrderEventTag::Created, sample_view()));

        assert!(email.subject.contains("#42"));
        assert!(email.text.contains("2 x PandaPlush"));
        assert!(email.text.contains("Total: 25.00"));
        assert!(email.html.contains("<td>PandaPlush</td>"));
    }

    #[test]
    fn test_customer_name_is_escaped() {
        let mut view = sample_view();
        view.customer_name = "<script>".to_string();
        let email = render_email(&OrderEvent::new(OrderEventTag::Shipped, view));
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
    }

    #[test]
    fn test_template_variables_are_positional() {
        let variables = template_variables(&sample_view());
        assert_eq!(variables["1"], "Ana");
        assert_eq!(variables["2"], "#42");
        assert_eq!(variables["3"], "25.00");
    }
}
