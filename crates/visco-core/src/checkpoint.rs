// ─────────────────────────────────────────────────────────────────────
// Visco Core — Checkpoint
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Raw component arrays in an `.npz` archive, indexed by the stable cell
//! index. Values are stored verbatim so a restart is bit-for-bit.

use ndarray::{Array1, Array2};
use ndarray_npy::{NpzReader, NpzWriter};
use std::fs::File;
use std::path::Path;
use visco_types::error::{ViscoError, ViscoResult};
use visco_types::state::{Representation, TensorField};

#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub step: u64,
    pub time: f64,
    pub log_conformation: TensorField,
    pub conformation: TensorField,
}

impl Checkpoint {
    pub fn save(&self, path: &Path) -> ViscoResult<()> {
        let repr = self.log_conformation.repr();
        if self.conformation.repr() != repr
            || self.conformation.ncells() != self.log_conformation.ncells()
        {
            return Err(ViscoError::FieldShapeMismatch {
                field: "conformation".to_string(),
                expected: self.log_conformation.data().dim(),
                got: self.conformation.data().dim(),
            });
        }
        let file = File::create(path)?;
        let mut npz = NpzWriter::new(file);
        let write_err = |e: ndarray_npy::WriteNpzError| {
            ViscoError::Checkpoint(format!("failed to write {}: {e}", path.display()))
        };
        npz.add_array("representation", &Array1::from(vec![repr.tag()]))
            .map_err(write_err)?;
        npz.add_array("step", &Array1::from(vec![self.step]))
            .map_err(write_err)?;
        npz.add_array("time", &Array1::from(vec![self.time]))
            .map_err(write_err)?;
        npz.add_array("log_conformation", self.log_conformation.data())
            .map_err(write_err)?;
        npz.add_array("conformation", self.conformation.data())
            .map_err(write_err)?;
        npz.finish().map_err(write_err)?;
        tracing::info!(
            "Checkpoint written: {} (step {}, {} cells)",
            path.display(),
            self.step,
            self.log_conformation.ncells()
        );
        Ok(())
    }

    pub fn load(path: &Path) -> ViscoResult<Self> {
        let file = File::open(path)?;
        let mut npz = NpzReader::new(file)
            .map_err(|e| ViscoError::Checkpoint(format!("failed to open {}: {e}", path.display())))?;

        let tag: Array1<u8> = read_array(&mut npz, "representation")?;
        let repr = tag
            .get(0)
            .and_then(|&t| Representation::from_tag(t))
            .ok_or_else(|| ViscoError::Checkpoint(format!("unknown representation tag {tag:?}")))?;
        let step: Array1<u64> = read_array(&mut npz, "step")?;
        let time: Array1<f64> = read_array(&mut npz, "time")?;
        let log: Array2<f64> = read_array(&mut npz, "log_conformation")?;
        let conf: Array2<f64> = read_array(&mut npz, "conformation")?;
        if log.dim() != conf.dim() {
            return Err(ViscoError::FieldShapeMismatch {
                field: "conformation".to_string(),
                expected: log.dim(),
                got: conf.dim(),
            });
        }

        let checkpoint = Checkpoint {
            step: step.get(0).copied().unwrap_or(0),
            time: time.get(0).copied().unwrap_or(0.0),
            log_conformation: TensorField::from_array(repr, log)?,
            conformation: TensorField::from_array(repr, conf)?,
        };
        if let Some(index) = checkpoint.log_conformation.first_non_finite() {
            return Err(ViscoError::NonFiniteField {
                field: "log_conformation".to_string(),
                index,
            });
        }
        tracing::info!(
            "Checkpoint restored: {} (step {})",
            path.display(),
            checkpoint.step
        );
        Ok(checkpoint)
    }
}

fn read_array<A, D>(npz: &mut NpzReader<File>, key: &str) -> ViscoResult<ndarray::Array<A, D>>
where
    A: ndarray_npy::ReadableElement,
    D: ndarray::Dimension,
{
    npz.by_name::<ndarray::OwnedRepr<A>, D>(&format!("{key}.npy"))
        .or_else(|_| npz.by_name::<ndarray::OwnedRepr<A>, D>(key))
        .map_err(|e| ViscoError::Checkpoint(format!("failed to read {key} from npz: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(tag: &str) -> std::path::PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("visco_ckpt_{tag}_{stamp}.npz"))
    }

    #[test]
    fn test_roundtrip_is_bit_exact() {
        let repr = Representation::Scalar2D;
        let log = TensorField::from_fn(repr, 50, |idx, c| {
            ((idx * 7 + c) as f64 * 0.123_456_789).sin() / 3.0
        });
        let conf = TensorField::from_fn(repr, 50, |idx, c| 1.0 + (idx + c) as f64 * 1e-17);
        let ckpt = Checkpoint {
            step: 1234,
            time: 0.75,
            log_conformation: log,
            conformation: conf,
        };
        let path = temp_path("roundtrip");
        ckpt.save(&path).unwrap();
        let back = Checkpoint::load(&path).unwrap();
        assert_eq!(back, ckpt);
        for (a, b) in back
            .log_conformation
            .data()
            .iter()
            .zip(ckpt.log_conformation.data().iter())
        {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_rejects_mismatched_fields() {
        let ckpt = Checkpoint {
            step: 0,
            time: 0.0,
            log_conformation: TensorField::zeros(Representation::Tensor2D, 4),
            conformation: TensorField::identity(Representation::Tensor2D, 5),
        };
        assert!(ckpt.save(&temp_path("mismatch")).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = temp_path("missing");
        assert!(matches!(Checkpoint::load(&path), Err(ViscoError::Io(_))));
    }
}
