//! Security parameters
//!
//! [`SecurityParameters`] carries the heuristic inputs from which a context is
//! built. Chain length and cyclotomic index may be left unset; they are filled
//! in by [`crate::derive_parameters`].

use crate::errors::{ParamsError, ParamsResult};
use crate::ring::is_prime;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Heuristic inputs for context creation.
///
/// Field names follow the usual HE notation in their doc comments:
/// `p`, `r`, `c`, `w`, `d`, `sec`, `L`, `m`, `R`, `s`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityParameters {
    /// Plaintext base prime `p`
    pub plaintext_modulus: u64,
    /// Hensel lifting exponent `r`; the plaintext space is `p^r`
    pub hensel_lift: u32,
    /// Number of columns in key-switching matrices `c`
    pub columns: u64,
    /// Hamming weight of the secret key `w`
    pub hamming_weight: u64,
    /// Degree of the slot field extension `d`; `0` means the intrinsic one
    pub field_degree: u64,
    /// Target security level in bits
    pub security_bits: u32,
    /// Modulus-chain length `L`, derived when unset
    pub chain_length: Option<u64>,
    /// Cyclotomic index `m`, derived when unset
    pub cyclotomic_index: Option<u64>,
    /// Expected multiplicative depth `R`
    pub levels: u64,
    /// Minimum number of plaintext slots `s`
    pub min_slots: u64,
    /// Generators of `(Z/mZ)* / <p>`
    pub generators: Vec<i64>,
    /// Orders of the generators
    pub orders: Vec<i64>,
}

impl Default for SecurityParameters {
    fn default() -> Self {
        Self {
            plaintext_modulus: 2,
            hensel_lift: 1,
            columns: 2,
            hamming_weight: 64,
            field_degree: 0,
            security_bits: 80,
            chain_length: None,
            cyclotomic_index: None,
            levels: 3,
            min_slots: 0,
            generators: Vec::new(),
            orders: Vec::new(),
        }
    }
}

impl SecurityParameters {
    /// Create a new parameter builder
    pub fn builder() -> SecurityParametersBuilder {
        SecurityParametersBuilder::new()
    }

    /// Named presets.
    ///
    /// - `dev`: binary plaintexts, shallow circuits, low security; fast to set up
    /// - `test`: binary plaintexts at the historical defaults
    /// - `prod`: binary plaintexts at 128-bit security
    /// - `batched`: a batching-friendly prime (`p = 65537`) at 128-bit security
    pub fn preset(name: &str) -> ParamsResult<Self> {
        let params = match name {
            "dev" => Self {
                levels: 1,
                ..Self::default()
            },
            "test" => Self::default(),
            "prod" => Self {
                security_bits: 128,
                columns: 3,
                ..Self::default()
            },
            "batched" => Self {
                plaintext_modulus: 65537,
                security_bits: 128,
                levels: 2,
                ..Self::default()
            },
            other => return Err(ParamsError::UnknownPreset(other.to_string())),
        };
        Ok(params)
    }

    /// Plaintext space `p^r`
    pub fn plaintext_space(&self) -> ParamsResult<u64> {
        self.plaintext_modulus
            .checked_pow(self.hensel_lift)
            .filter(|t| *t < (1 << 62))
            .ok_or_else(|| {
                ParamsError::invalid(
                    "hensel_lift",
                    format!(
                        "{}^{} does not fit in 62 bits",
                        self.plaintext_modulus, self.hensel_lift
                    ),
                )
            })
    }

    /// Check every field invariant.
    pub fn validate(&self) -> ParamsResult<()> {
        if !is_prime(self.plaintext_modulus) {
            return Err(ParamsError::invalid(
                "plaintext_modulus",
                format!("{} is not prime", self.plaintext_modulus),
            ));
        }
        if self.hensel_lift == 0 {
            return Err(ParamsError::invalid("hensel_lift", "must be >= 1"));
        }
        self.plaintext_space()?;
        if self.columns == 0 {
            return Err(ParamsError::invalid("columns", "must be >= 1"));
        }
        if self.hamming_weight == 0 {
            return Err(ParamsError::invalid("hamming_weight", "must be >= 1"));
        }
        if self.security_bits == 0 {
            return Err(ParamsError::invalid("security_bits", "must be >= 1"));
        }
        if self.levels == 0 {
            return Err(ParamsError::invalid("levels", "must be >= 1"));
        }
        if self.chain_length == Some(0) {
            return Err(ParamsError::invalid("chain_length", "must be >= 1"));
        }
        if let Some(m) = self.cyclotomic_index {
            if m < 2 {
                return Err(ParamsError::invalid("cyclotomic_index", "must be >= 2"));
            }
        }
        if self.generators.len() != self.orders.len() {
            return Err(ParamsError::invalid(
                "orders",
                format!(
                    "{} generators but {} orders",
                    self.generators.len(),
                    self.orders.len()
                ),
            ));
        }
        Ok(())
    }

    /// Parse parameters from a TOML document and validate them
    pub fn from_toml_str(s: &str) -> ParamsResult<Self> {
        let params: Self = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> ParamsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ParamsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Render parameters as TOML
    pub fn to_toml_string(&self) -> ParamsResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write parameters to a TOML file
    pub fn save_toml_file(&self, path: impl AsRef<Path>) -> ParamsResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?).map_err(|source| ParamsError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Builder for [`SecurityParameters`]; unset fields keep their defaults.
#[derive(Debug, Default)]
pub struct SecurityParametersBuilder {
    params: SecurityParameters,
}

impl SecurityParametersBuilder {
    /// Create a new parameter builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a named preset
    pub fn from_preset(name: &str) -> ParamsResult<Self> {
        Ok(Self {
            params: SecurityParameters::preset(name)?,
        })
    }

    /// Set the plaintext base prime `p`
    pub fn set_plaintext_modulus(mut self, p: u64) -> Self {
        self.params.plaintext_modulus = p;
        self
    }

    /// Set the Hensel lifting exponent `r`
    pub fn set_hensel_lift(mut self, r: u32) -> Self {
        self.params.hensel_lift = r;
        self
    }

    /// Set the number of key-switching columns `c`
    pub fn set_columns(mut self, c: u64) -> Self {
        self.params.columns = c;
        self
    }

    /// Set the secret key Hamming weight `w`
    pub fn set_hamming_weight(mut self, w: u64) -> Self {
        self.params.hamming_weight = w;
        self
    }

    /// Set the slot field degree `d`
    pub fn set_field_degree(mut self, d: u64) -> Self {
        self.params.field_degree = d;
        self
    }

    /// Set the security level in bits
    pub fn set_security_bits(mut self, sec: u32) -> Self {
        self.params.security_bits = sec;
        self
    }

    /// Fix the modulus-chain length `L`
    pub fn set_chain_length(mut self, l: u64) -> Self {
        self.params.chain_length = Some(l);
        self
    }

    /// Fix the cyclotomic index `m`
    pub fn set_cyclotomic_index(mut self, m: u64) -> Self {
        self.params.cyclotomic_index = Some(m);
        self
    }

    /// Set the expected multiplicative depth `R`
    pub fn set_levels(mut self, r: u64) -> Self {
        self.params.levels = r;
        self
    }

    /// Set the minimum slot count `s`
    pub fn set_min_slots(mut self, s: u64) -> Self {
        self.params.min_slots = s;
        self
    }

    /// Set generators and their orders together
    pub fn set_generators(mut self, gens: &[i64], ords: &[i64]) -> Self {
        self.params.generators = gens.to_vec();
        self.params.orders = ords.to_vec();
        self
    }

    /// Validate and return the parameters
    pub fn build(self) -> ParamsResult<SecurityParameters> {
        self.params.validate()?;
        Ok(self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let params = SecurityParameters::default();
        assert_eq!(params.plaintext_modulus, 2);
        assert_eq!(params.hensel_lift, 1);
        assert_eq!(params.columns, 2);
        assert_eq!(params.hamming_weight, 64);
        assert_eq!(params.field_degree, 0);
        assert_eq!(params.security_bits, 80);
        assert_eq!(params.levels, 3);
        assert_eq!(params.min_slots, 0);
        assert!(params.chain_length.is_none());
        assert!(params.cyclotomic_index.is_none());
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_builder_validation() {
        let err = SecurityParameters::builder()
            .set_plaintext_modulus(15)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ParamsError::InvalidParameter {
                name: "plaintext_modulus",
                ..
            }
        ));

        assert!(SecurityParameters::builder().set_hensel_lift(0).build().is_err());
        assert!(SecurityParameters::builder().set_columns(0).build().is_err());
        assert!(SecurityParameters::builder().set_levels(0).build().is_err());
        assert!(SecurityParameters::builder().set_chain_length(0).build().is_err());
        assert!(
            SecurityParameters::builder()
                .set_cyclotomic_index(1)
                .build()
                .is_err()
        );
        assert!(
            SecurityParameters::builder()
                .set_generators(&[3], &[])
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_plaintext_space_overflow() {
        let err = SecurityParameters::builder()
            .set_plaintext_modulus(65537)
            .set_hensel_lift(4)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ParamsError::InvalidParameter {
                name: "hensel_lift",
                ..
            }
        ));

        let params = SecurityParameters::builder()
            .set_plaintext_modulus(3)
            .set_hensel_lift(4)
            .build()
            .unwrap();
        assert_eq!(params.plaintext_space().unwrap(), 81);
    }

    #[test]
    fn test_presets() {
        for name in ["dev", "test", "prod", "batched"] {
            let params = SecurityParameters::preset(name).unwrap();
            assert!(params.validate().is_ok(), "preset {name} should validate");
        }
        assert_eq!(SecurityParameters::preset("prod").unwrap().security_bits, 128);
        assert!(matches!(
            SecurityParameters::preset("nope"),
            Err(ParamsError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_toml_partial_document_uses_defaults() {
        let params = SecurityParameters::from_toml_str(
            r#"
            plaintext_modulus = 257
            levels = 5
            chain_length = 12
            "#,
        )
        .unwrap();
        assert_eq!(params.plaintext_modulus, 257);
        assert_eq!(params.levels, 5);
        assert_eq!(params.chain_length, Some(12));
        assert_eq!(params.hamming_weight, 64);
        assert!(params.cyclotomic_index.is_none());
    }

    #[test]
    fn test_toml_rejects_unknown_and_invalid() {
        assert!(matches!(
            SecurityParameters::from_toml_str("bogus = 1"),
            Err(ParamsError::TomlParse(_))
        ));
        assert!(matches!(
            SecurityParameters::from_toml_str("plaintext_modulus = 4"),
            Err(ParamsError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_toml_file_round_trip() {
        let params = SecurityParameters::builder()
            .set_plaintext_modulus(65537)
            .set_cyclotomic_index(4096)
            .set_chain_length(4)
            .set_generators(&[5], &[1024])
            .build()
            .unwrap();

        let file = NamedTempFile::new().unwrap();
        params.save_toml_file(file.path()).unwrap();
        let loaded = SecurityParameters::from_toml_file(file.path()).unwrap();
        assert_eq!(loaded, params);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = SecurityParameters::from_toml_file("/nonexistent/params.toml").unwrap_err();
        match err {
            ParamsError::Io { path, .. } => assert!(path.contains("params.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
