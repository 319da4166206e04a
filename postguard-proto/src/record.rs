//! Typed wrappers for the two policy-advertisement TXT records.
//!
//! `_mta-sts.<domain>` advertises that an MTA-STS policy exists (and a
//! version token to detect changes); `_smtp._tls.<domain>` advertises
//! where delivery-security reports should go. Both are thin shells
//! around the [`crate::sskv`] codec with a fixed field order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::sskv;

/// The `_mta-sts` TXT record: `v=STSv1; id=<token>;`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StsRecord {
    /// Protocol version, `STSv1` unless the record says otherwise.
    pub v: String,
    /// Opaque policy version token. Its only contract is equality
    /// comparison across fetches - a changed `id` means the published
    /// policy document changed.
    pub id: String,
}

impl StsRecord {
    /// Default protocol version.
    pub const VERSION: &'static str = "STSv1";

    const FIELD_ORDER: [&'static str; 2] = ["v", "id"];

    /// Decodes a TXT record body.
    ///
    /// Returns `None` when the text yields no key/value pairs or the
    /// required `id` field is missing; a partial record is never built.
    /// `v` defaults to [`Self::VERSION`] when absent.
    #[must_use]
    pub fn from_txt(text: &str) -> Option<Self> {
        let mut fields = sskv::decode(text)?;
        let id = fields.remove("id")?;
        let v = fields
            .remove("v")
            .unwrap_or_else(|| Self::VERSION.to_string());

        Some(Self { v, id })
    }

    /// Encodes the record back to its wire form.
    #[must_use]
    pub fn to_txt(&self) -> String {
        let mut fields = HashMap::new();
        fields.insert("v".to_string(), self.v.clone());
        fields.insert("id".to_string(), self.id.clone());
        sskv::encode(&fields, &Self::FIELD_ORDER)
    }
}

/// The `_smtp._tls` TXT record: `v=TLSRPTv1; rua=<uri>;`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsrptRecord {
    /// Protocol version, `TLSRPTv1` unless the record says otherwise.
    pub v: String,
    /// Reporting URI (typically `mailto:` or `https:`).
    pub rua: String,
}

impl TlsrptRecord {
    /// Default protocol version.
    pub const VERSION: &'static str = "TLSRPTv1";

    const FIELD_ORDER: [&'static str; 2] = ["v", "rua"];

    /// Decodes a TXT record body.
    ///
    /// Returns `None` when no pairs were extracted or the required
    /// `rua` field is missing. `v` defaults to [`Self::VERSION`].
    #[must_use]
    pub fn from_txt(text: &str) -> Option<Self> {
        let mut fields = sskv::decode(text)?;
        let rua = fields.remove("rua")?;
        let v = fields
            .remove("v")
            .unwrap_or_else(|| Self::VERSION.to_string());

        Some(Self { v, rua })
    }

    /// Encodes the record back to its wire form.
    #[must_use]
    pub fn to_txt(&self) -> String {
        let mut fields = HashMap::new();
        fields.insert("v".to_string(), self.v.clone());
        fields.insert("rua".to_string(), self.rua.clone());
        sskv::encode(&fields, &Self::FIELD_ORDER)
    }
}
