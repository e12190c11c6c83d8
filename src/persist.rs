//! JSON persistence of key material.
//!
//! [`TableKeys`] and [`CustodianShareSet`] serialize to JSON documents in
//! which scalars and points appear as hex strings of their fixed-width
//! encodings (28-byte big-endian scalars, 29-byte compressed points). The
//! mirrors carry no version field; the files are operator artifacts, not a
//! wire protocol.
//!
//! Written files contain live secrets: the issuer's file holds every column
//! secret, and a custodian's file holds its shares. Where they land is the
//! operator's problem; this module only promises the round trip.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    arith::{
        curve::{CurveContext, Scalar, FIELD_BYTES},
        shamir::ByteShare,
    },
    errors::Error,
    scheme::keys::{ColumnPublicKey, CustodianShareSet, PrivateKeyBundle, TableKeys},
    table::{PrimaryKey, TableInfo},
};

#[derive(Serialize, Deserialize)]
struct TableKeysRepr {
    info: TableInfo,
    row_scalars: Vec<(PrimaryKey, String)>,
    columns: Vec<(String, BundleRepr)>,
    publics: Vec<(String, String)>,
}

#[derive(Serialize, Deserialize)]
struct BundleRepr {
    x: String,
    byte_shares: Vec<(u8, String)>,
    scalar_shares: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct CustodianRepr {
    custodian: u8,
    info: TableInfo,
    row_scalars: Vec<(PrimaryKey, String)>,
    partial_keys: Vec<(String, String)>,
}

fn scalar_hex(ctx: &CurveContext, scalar: &Scalar) -> String {
    hex::encode(ctx.scalar_to_be_bytes(scalar))
}

fn scalar_from_hex(ctx: &CurveContext, hex_str: &str) -> Result<Scalar, Error> {
    let bytes: [u8; FIELD_BYTES] = hex::decode(hex_str)
        .map_err(|e| Error::MalformedInput(format!("invalid scalar hex: {e}")))?
        .try_into()
        .map_err(|_| Error::MalformedInput("scalar hex has the wrong length".into()))?;
    Ok(ctx.scalar_from_be_bytes(&bytes))
}

impl TableKeys {
    /// Serializes the bundle to a JSON string.
    pub fn to_json(&self, ctx: &CurveContext) -> Result<String, Error> {
        let repr = TableKeysRepr {
            info: self.info.clone(),
            row_scalars: self
                .row_scalars
                .iter()
                .map(|(k, r)| (k.clone(), scalar_hex(ctx, r)))
                .collect(),
            columns: self
                .columns
                .iter()
                .map(|(name, bundle)| {
                    (
                        name.clone(),
                        BundleRepr {
                            x: scalar_hex(ctx, bundle.secret()),
                            byte_shares: bundle
                                .byte_shares()
                                .iter()
                                .map(|s| (s.index, hex::encode(s.bytes)))
                                .collect(),
                            scalar_shares: bundle
                                .scalar_shares()
                                .iter()
                                .map(|s| scalar_hex(ctx, s))
                                .collect(),
                        },
                    )
                })
                .collect(),
            publics: self
                .publics
                .iter()
                .map(|(name, key)| (name.clone(), hex::encode(crate::arith::compress(&key.point))))
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&repr)?)
    }

    /// Parses a bundle back from [`to_json`](Self::to_json) output.
    pub fn from_json(ctx: &CurveContext, json: &str) -> Result<Self, Error> {
        let repr: TableKeysRepr = serde_json::from_str(json)?;
        let row_scalars = repr
            .row_scalars
            .into_iter()
            .map(|(k, hex_str)| Ok((k, scalar_from_hex(ctx, &hex_str)?)))
            .collect::<Result<_, Error>>()?;
        let columns = repr
            .columns
            .into_iter()
            .map(|(name, bundle)| {
                let x = scalar_from_hex(ctx, &bundle.x)?;
                if bundle.byte_shares.len() != 3 || bundle.scalar_shares.len() != 3 {
                    return Err(Error::MalformedInput(format!(
                        "column {name} does not carry exactly three shares"
                    )));
                }
                let mut byte_shares = Vec::with_capacity(3);
                for (index, hex_str) in &bundle.byte_shares {
                    let bytes: [u8; FIELD_BYTES] = hex::decode(hex_str)
                        .map_err(|e| Error::MalformedInput(format!("invalid share hex: {e}")))?
                        .try_into()
                        .map_err(|_| {
                            Error::MalformedInput("byte share has the wrong length".into())
                        })?;
                    byte_shares.push(ByteShare {
                        index: *index,
                        bytes,
                    });
                }
                let byte_shares: [ByteShare<FIELD_BYTES>; 3] = byte_shares
                    .try_into()
                    .map_err(|_| Error::MalformedInput("expected three byte shares".into()))?;
                let mut scalar_shares = [Scalar::from(0u64); 3];
                for (slot, hex_str) in bundle.scalar_shares.iter().enumerate() {
                    scalar_shares[slot] = scalar_from_hex(ctx, hex_str)?;
                }
                Ok((
                    name,
                    PrivateKeyBundle::from_parts(x, byte_shares, scalar_shares),
                ))
            })
            .collect::<Result<_, Error>>()?;
        let publics = repr
            .publics
            .into_iter()
            .map(|(name, hex_str)| {
                let bytes = hex::decode(&hex_str)
                    .map_err(|e| Error::MalformedInput(format!("invalid point hex: {e}")))?;
                Ok((
                    name,
                    ColumnPublicKey {
                        curve: ctx.curve(),
                        point: crate::arith::decompress(&bytes)?,
                    },
                ))
            })
            .collect::<Result<_, Error>>()?;
        Ok(TableKeys {
            info: repr.info,
            row_scalars,
            columns,
            publics,
        })
    }

    /// Writes the bundle to a file.
    pub fn save(&self, ctx: &CurveContext, path: &Path) -> Result<(), Error> {
        fs::write(path, self.to_json(ctx)?)?;
        Ok(())
    }

    /// Reads a bundle back from a file.
    pub fn load(ctx: &CurveContext, path: &Path) -> Result<Self, Error> {
        Self::from_json(ctx, &fs::read_to_string(path)?)
    }
}

impl CustodianShareSet {
    /// Serializes the share set to a JSON string.
    pub fn to_json(&self, ctx: &CurveContext) -> Result<String, Error> {
        let repr = CustodianRepr {
            custodian: self.custodian,
            info: self.info.clone(),
            row_scalars: self
                .row_scalars
                .iter()
                .map(|(k, r)| (k.clone(), scalar_hex(ctx, r)))
                .collect(),
            partial_keys: self
                .partial_keys
                .iter()
                .map(|(name, s)| (name.clone(), scalar_hex(ctx, s)))
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&repr)?)
    }

    /// Parses a share set back from [`to_json`](Self::to_json) output.
    pub fn from_json(ctx: &CurveContext, json: &str) -> Result<Self, Error> {
        let repr: CustodianRepr = serde_json::from_str(json)?;
        if !(1..=3).contains(&repr.custodian) {
            return Err(Error::BadShareIndex(repr.custodian));
        }
        Ok(CustodianShareSet {
            custodian: repr.custodian,
            info: repr.info,
            row_scalars: repr
                .row_scalars
                .into_iter()
                .map(|(k, hex_str)| Ok((k, scalar_from_hex(ctx, &hex_str)?)))
                .collect::<Result<_, Error>>()?,
            partial_keys: repr
                .partial_keys
                .into_iter()
                .map(|(name, hex_str)| Ok((name, scalar_from_hex(ctx, &hex_str)?)))
                .collect::<Result<_, Error>>()?,
        })
    }

    /// Writes the share set to a file.
    pub fn save(&self, ctx: &CurveContext, path: &Path) -> Result<(), Error> {
        fs::write(path, self.to_json(ctx)?)?;
        Ok(())
    }

    /// Reads a share set back from a file.
    pub fn load(ctx: &CurveContext, path: &Path) -> Result<Self, Error> {
        Self::from_json(ctx, &fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::rngs::OsRng;

    use super::*;
    use crate::{
        config::ColumnMode,
        scheme::keys::set_keys,
        table::{ColumnSpec, ColumnType},
    };

    fn sample_keys(ctx: &CurveContext) -> TableKeys {
        let (public, bundle, _) = set_keys(ctx, &mut OsRng);
        TableKeys {
            info: TableInfo {
                name: "t".into(),
                rows: 1,
                columns: vec![
                    ColumnSpec {
                        name: "id".into(),
                        ty: ColumnType::Int64,
                        mode: ColumnMode::Passthrough,
                    },
                    ColumnSpec {
                        name: "secret".into(),
                        ty: ColumnType::Text,
                        mode: ColumnMode::Hash,
                    },
                ],
            },
            row_scalars: HashMap::from([(
                PrimaryKey::Int(1),
                ctx.sample_scalar(&mut OsRng),
            )]),
            columns: HashMap::from([("secret".to_string(), bundle)]),
            publics: HashMap::from([("secret".to_string(), public)]),
        }
    }

    #[test]
    fn table_keys_round_trip() {
        let ctx = CurveContext::new();
        let keys = sample_keys(&ctx);
        let json = keys.to_json(&ctx).unwrap();
        let restored = TableKeys::from_json(&ctx, &json).unwrap();

        assert_eq!(restored.info.name, "t");
        assert_eq!(restored.row_scalars, keys.row_scalars);
        assert_eq!(
            restored.columns["secret"].secret(),
            keys.columns["secret"].secret()
        );
        assert_eq!(
            restored.publics["secret"].point,
            keys.publics["secret"].point
        );
        for index in 1u8..=3 {
            assert_eq!(
                restored.columns["secret"].scalar_share(index).unwrap(),
                keys.columns["secret"].scalar_share(index).unwrap()
            );
            assert_eq!(
                restored.columns["secret"].byte_share(index).unwrap().bytes,
                keys.columns["secret"].byte_share(index).unwrap().bytes
            );
        }
    }

    #[test]
    fn custodian_share_set_round_trip() {
        let ctx = CurveContext::new();
        let custodian = sample_keys(&ctx).extract_share(2).unwrap();
        let json = custodian.to_json(&ctx).unwrap();
        let restored = CustodianShareSet::from_json(&ctx, &json).unwrap();
        assert_eq!(restored.custodian, 2);
        assert_eq!(restored.row_scalars, custodian.row_scalars);
        assert_eq!(restored.partial_keys, custodian.partial_keys);
    }

    #[test]
    fn file_round_trip() {
        let ctx = CurveContext::new();
        let keys = sample_keys(&ctx);
        let path = std::env::temp_dir().join(format!("colcrypt-keys-{}.json", std::process::id()));
        keys.save(&ctx, &path).unwrap();
        let restored = TableKeys::load(&ctx, &path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(restored.row_scalars, keys.row_scalars);
    }

    #[test]
    fn bad_custodian_index_rejected() {
        let ctx = CurveContext::new();
        let mut json = sample_keys(&ctx)
            .extract_share(1)
            .unwrap()
            .to_json(&ctx)
            .unwrap();
        json = json.replacen("\"custodian\": 1", "\"custodian\": 9", 1);
        assert!(matches!(
            CustodianShareSet::from_json(&ctx, &json),
            Err(Error::BadShareIndex(9))
        ));
    }
}
