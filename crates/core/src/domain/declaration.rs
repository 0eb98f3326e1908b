use serde::{Deserialize, Serialize};

/// Number of fields in a customs declaration. The schema is fixed; every
/// per-field table in this crate is sized against this constant.
pub const FIELD_COUNT: usize = 7;

/// Identifier for one of the seven declaration fields, in fixed schema order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclarationField {
    Shipper,
    Receiver,
    GoodsDescription,
    Value,
    CountryOfOrigin,
    HsCode,
    Weight,
}

impl DeclarationField {
    /// All fields in schema order. Scans that promise deterministic output
    /// iterate this array, never a hash map.
    pub const ALL: [DeclarationField; FIELD_COUNT] = [
        DeclarationField::Shipper,
        DeclarationField::Receiver,
        DeclarationField::GoodsDescription,
        DeclarationField::Value,
        DeclarationField::CountryOfOrigin,
        DeclarationField::HsCode,
        DeclarationField::Weight,
    ];

    /// Position in schema order.
    pub fn index(self) -> usize {
        match self {
            Self::Shipper => 0,
            Self::Receiver => 1,
            Self::GoodsDescription => 2,
            Self::Value => 3,
            Self::CountryOfOrigin => 4,
            Self::HsCode => 5,
            Self::Weight => 6,
        }
    }

    /// Wire name used by the upstream pipeline payloads.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Shipper => "shipper",
            Self::Receiver => "receiver",
            Self::GoodsDescription => "goodsDescription",
            Self::Value => "value",
            Self::CountryOfOrigin => "countryOfOrigin",
            Self::HsCode => "hsCode",
            Self::Weight => "weight",
        }
    }

    /// Parse a wire name. Accepts both the camelCase pipeline spelling and
    /// the snake_case alias the original backend tolerated.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            "shipper" => Some(Self::Shipper),
            "receiver" => Some(Self::Receiver),
            "goodsDescription" | "goods_description" => Some(Self::GoodsDescription),
            "value" => Some(Self::Value),
            "countryOfOrigin" | "country_of_origin" => Some(Self::CountryOfOrigin),
            "hsCode" | "hs_code" => Some(Self::HsCode),
            "weight" => Some(Self::Weight),
            _ => None,
        }
    }
}

/// The seven-field customs declaration under review.
///
/// All fields are opaque strings; a value that is empty after trimming is the
/// distinguished "missing" state. Values keep whatever formatting the
/// extraction stage produced (currency markers, units, punctuation).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub shipper: String,
    pub receiver: String,
    #[serde(alias = "goods_description")]
    pub goods_description: String,
    pub value: String,
    #[serde(alias = "country_of_origin")]
    pub country_of_origin: String,
    #[serde(alias = "hs_code")]
    pub hs_code: String,
    pub weight: String,
}

impl Declaration {
    pub fn field(&self, field: DeclarationField) -> &str {
        match field {
            DeclarationField::Shipper => &self.shipper,
            DeclarationField::Receiver => &self.receiver,
            DeclarationField::GoodsDescription => &self.goods_description,
            DeclarationField::Value => &self.value,
            DeclarationField::CountryOfOrigin => &self.country_of_origin,
            DeclarationField::HsCode => &self.hs_code,
            DeclarationField::Weight => &self.weight,
        }
    }

    pub fn set_field(&mut self, field: DeclarationField, value: impl Into<String>) {
        let slot = match field {
            DeclarationField::Shipper => &mut self.shipper,
            DeclarationField::Receiver => &mut self.receiver,
            DeclarationField::GoodsDescription => &mut self.goods_description,
            DeclarationField::Value => &mut self.value,
            DeclarationField::CountryOfOrigin => &mut self.country_of_origin,
            DeclarationField::HsCode => &mut self.hs_code,
            DeclarationField::Weight => &mut self.weight,
        };
        *slot = value.into();
    }

    /// A field is missing when its value is empty after trimming.
    pub fn is_missing(&self, field: DeclarationField) -> bool {
        self.field(field).trim().is_empty()
    }

    /// Missing fields in schema order.
    pub fn missing_fields(&self) -> Vec<DeclarationField> {
        DeclarationField::ALL.into_iter().filter(|field| self.is_missing(*field)).collect()
    }

    pub fn is_complete(&self) -> bool {
        DeclarationField::ALL.iter().all(|field| !self.is_missing(*field))
    }
}

#[cfg(test)]
mod tests {
    use super::{Declaration, DeclarationField, FIELD_COUNT};

    fn filled() -> Declaration {
        Declaration {
            shipper: "Acme Export GmbH, Hamburg".to_string(),
            receiver: "Nordic Imports AS, Oslo".to_string(),
            goods_description: "Integrated circuits".to_string(),
            value: "USD 12,400".to_string(),
            country_of_origin: "Germany".to_string(),
            hs_code: "854231".to_string(),
            weight: "18.2 kg".to_string(),
        }
    }

    #[test]
    fn schema_order_is_stable() {
        assert_eq!(DeclarationField::ALL.len(), FIELD_COUNT);
        for (position, field) in DeclarationField::ALL.into_iter().enumerate() {
            assert_eq!(field.index(), position);
        }
    }

    #[test]
    fn whitespace_only_counts_as_missing() {
        let mut declaration = filled();
        declaration.set_field(DeclarationField::HsCode, "   ");

        assert!(declaration.is_missing(DeclarationField::HsCode));
        assert_eq!(declaration.missing_fields(), vec![DeclarationField::HsCode]);
        assert!(!declaration.is_complete());
    }

    #[test]
    fn field_access_round_trips_through_setter() {
        let mut declaration = Declaration::default();
        declaration.set_field(DeclarationField::CountryOfOrigin, "Portugal");

        assert_eq!(declaration.field(DeclarationField::CountryOfOrigin), "Portugal");
        assert_eq!(declaration.country_of_origin, "Portugal");
    }

    #[test]
    fn wire_names_parse_in_both_spellings() {
        for field in DeclarationField::ALL {
            assert_eq!(DeclarationField::from_wire_name(field.wire_name()), Some(field));
        }
        assert_eq!(
            DeclarationField::from_wire_name("goods_description"),
            Some(DeclarationField::GoodsDescription)
        );
        assert_eq!(DeclarationField::from_wire_name("unknown"), None);
    }

    #[test]
    fn declaration_deserializes_camel_case_payload() {
        let payload = r#"{
            "shipper": "Acme Export GmbH",
            "receiver": "Nordic Imports AS",
            "goodsDescription": "Integrated circuits",
            "value": "USD 12,400",
            "countryOfOrigin": "Germany",
            "hsCode": "854231",
            "weight": "18.2 kg"
        }"#;

        let declaration: Declaration =
            serde_json::from_str(payload).expect("camelCase payload should parse");
        assert_eq!(declaration.hs_code, "854231");
        assert!(declaration.is_complete());
    }
}
