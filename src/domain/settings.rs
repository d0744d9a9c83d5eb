use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    #[default]
    BlackAndWhite,
    Color,
}

impl ColorMode {
    pub const ALL: [ColorMode; 2] = [ColorMode::BlackAndWhite, ColorMode::Color];

    pub fn label(&self) -> &'static str {
        match self {
            ColorMode::BlackAndWhite => "B&W",
            ColorMode::Color => "Color",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaperType {
    #[default]
    Standard,
    Premium,
    Cardstock,
    Glossy,
}

impl PaperType {
    pub const ALL: [PaperType; 4] = [
        PaperType::Standard,
        PaperType::Premium,
        PaperType::Cardstock,
        PaperType::Glossy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PaperType::Standard => "Standard (80gsm)",
            PaperType::Premium => "Premium (100gsm)",
            PaperType::Cardstock => "Cardstock (200gsm)",
            PaperType::Glossy => "Glossy Photo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BindingType {
    #[default]
    None,
    Staple,
    Spiral,
    Thermal,
}

impl BindingType {
    pub const ALL: [BindingType; 4] = [
        BindingType::None,
        BindingType::Staple,
        BindingType::Spiral,
        BindingType::Thermal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BindingType::None => "No Binding",
            BindingType::Staple => "Staple (Corner)",
            BindingType::Spiral => "Spiral Binding",
            BindingType::Thermal => "Thermal Binding",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaperSize {
    #[default]
    A4,
    Legal,
    A3,
}

impl PaperSize {
    pub const ALL: [PaperSize; 3] = [PaperSize::A4, PaperSize::Legal, PaperSize::A3];

    pub fn label(&self) -> &'static str {
        match self {
            PaperSize::A4 => "A4",
            PaperSize::Legal => "Legal",
            PaperSize::A3 => "A3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMode {
    #[default]
    Pickup,
    Delivery,
}

impl DeliveryMode {
    pub const ALL: [DeliveryMode; 2] = [DeliveryMode::Pickup, DeliveryMode::Delivery];

    pub fn label(&self) -> &'static str {
        match self {
            DeliveryMode::Pickup => "Store Pickup",
            DeliveryMode::Delivery => "Home Delivery",
        }
    }
}

macro_rules! display_label {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

display_label!(ColorMode, PaperType, BindingType, PaperSize, DeliveryMode);

/// The print options for an order.
///
/// Settings are replaced wholesale on every change. `copies` and
/// `pages_per_copy` are never below 1: out-of-range values are clamped, not
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrintSettings {
    pub copies: u32,
    pub pages_per_copy: u32,
    /// Carried through to the order record; has no effect on price.
    pub double_sided: bool,
    pub color_mode: ColorMode,
    pub paper_type: PaperType,
    pub binding: BindingType,
    pub paper_size: PaperSize,
    pub delivery_mode: DeliveryMode,
    pub is_express: bool,
    pub special_instructions: String,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            copies: 1,
            pages_per_copy: 1,
            double_sided: false,
            color_mode: ColorMode::default(),
            paper_type: PaperType::default(),
            binding: BindingType::default(),
            paper_size: PaperSize::default(),
            delivery_mode: DeliveryMode::default(),
            is_express: false,
            special_instructions: String::new(),
        }
    }
}

impl PrintSettings {
    /// Returns the settings with `copies` and `pages_per_copy` raised to at least 1.
    pub fn clamped(mut self) -> Self {
        self.copies = self.copies.max(1);
        self.pages_per_copy = self.pages_per_copy.max(1);
        self
    }

    /// Clears the fields that only make sense for a single order, keeping the
    /// customer's other preferences.
    pub fn reset_for_new_order(&mut self) {
        self.pages_per_copy = 1;
        self.special_instructions.clear();
        self.is_express = false;
    }
}
