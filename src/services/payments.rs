//! Payment method catalog
//!
//! A fixed table of payment methods and the locale rule that decides which
//! three are offered, in order.

use serde::Serialize;

/// Identifier of a payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethodId {
    Card,
    Stripe,
    Paypal,
    Upi,
    Razorpay,
}

/// Display metadata for one payment method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

/// Billing region derived from a locale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    India,
    Global,
}

pub static PAYMENT_METHODS: [PaymentMethod; 5] = [
    PaymentMethod {
        id: PaymentMethodId::Card,
        name: "Credit / Debit Card",
        description: "Visa, Mastercard, American Express",
        icon: "credit-card",
    },
    PaymentMethod {
        id: PaymentMethodId::Stripe,
        name: "Stripe",
        description: "Secure checkout powered by Stripe",
        icon: "stripe",
    },
    PaymentMethod {
        id: PaymentMethodId::Paypal,
        name: "PayPal",
        description: "Pay with your PayPal balance or linked accounts",
        icon: "paypal",
    },
    PaymentMethod {
        id: PaymentMethodId::Upi,
        name: "UPI",
        description: "Google Pay, PhonePe, Paytm and other UPI apps",
        icon: "upi",
    },
    PaymentMethod {
        id: PaymentMethodId::Razorpay,
        name: "Razorpay",
        description: "Net banking, wallets and cards via Razorpay",
        icon: "razorpay",
    },
];

const INDIA_ORDER: [PaymentMethodId; 3] = [
    PaymentMethodId::Upi,
    PaymentMethodId::Razorpay,
    PaymentMethodId::Card,
];

const GLOBAL_ORDER: [PaymentMethodId; 3] = [
    PaymentMethodId::Card,
    PaymentMethodId::Stripe,
    PaymentMethodId::Paypal,
];

/// Any locale containing "in" (case-insensitive) counts as Indian
pub fn is_indian_locale(locale: &str) -> bool {
    locale.to_lowercase().contains("in")
}

pub fn region_for_locale(locale: &str) -> Region {
    if is_indian_locale(locale) {
        Region::India
    } else {
        Region::Global
    }
}

pub fn payment_method(id: PaymentMethodId) -> &'static PaymentMethod {
    PAYMENT_METHODS
        .iter()
        .find(|method| method.id == id)
        .unwrap_or(&PAYMENT_METHODS[0])
}

/// The three methods offered for a locale, in display order
pub fn payment_methods_for_locale(locale: &str) -> Vec<&'static PaymentMethod> {
    let order = match region_for_locale(locale) {
        Region::India => &INDIA_ORDER,
        Region::Global => &GLOBAL_ORDER,
    };
    order.iter().map(|id| payment_method(*id)).collect()
}
