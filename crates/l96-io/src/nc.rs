// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — netCDF Helpers
// ─────────────────────────────────────────────────────────────────────
//! Error mapping and typed accessors shared by the trajectory and window
//! datasets.

use std::path::Path;

use l96_types::{L96Error, L96Result};
use netcdf::AttributeValue;

/// A library failure while writing `path`.
pub(crate) fn write_error(path: &Path, e: netcdf::Error) -> L96Error {
    L96Error::io(path, std::io::Error::other(e))
}

fn format_error(path: &Path, what: impl std::fmt::Display) -> L96Error {
    L96Error::Format(format!("{}: {what}", path.display()))
}

/// Fixed dimension, or an unlimited one with no records when `len` is 0.
pub(crate) fn add_dim(
    file: &mut netcdf::FileMut,
    name: &str,
    len: usize,
) -> Result<(), netcdf::Error> {
    if len == 0 {
        file.add_unlimited_dimension(name)?;
    } else {
        file.add_dimension(name, len)?;
    }
    Ok(())
}

macro_rules! put_variable_fn {
    ($name:ident, $ty:ty) => {
        /// Define `name(dims)` and write `values`, which may be empty when
        /// the leading dimension is an unlimited one with no records.
        pub(crate) fn $name(
            file: &mut netcdf::FileMut,
            name: &str,
            dims: &[&str],
            long_name: Option<&str>,
            values: &[$ty],
        ) -> Result<(), netcdf::Error> {
            let mut var = file.add_variable::<$ty>(name, dims)?;
            if let Some(text) = long_name {
                var.put_attribute("long_name", text)?;
            }
            if !values.is_empty() {
                var.put_values(values, ..)?;
            }
            Ok(())
        }
    };
}

put_variable_fn!(put_f64, f64);
put_variable_fn!(put_u64, u64);

/// Open for reading. A missing file is an I/O error; anything the library
/// refuses to parse is a format error.
pub(crate) fn open(path: &Path) -> L96Result<netcdf::File> {
    std::fs::metadata(path).map_err(|e| L96Error::io(path, e))?;
    netcdf::open(path).map_err(|e| format_error(path, e))
}

/// Read-side view of an open dataset that names the file in its errors.
pub(crate) struct Reader<'a> {
    pub path: &'a Path,
    pub file: &'a netcdf::File,
}

impl Reader<'_> {
    pub fn dim_len(&self, name: &str) -> L96Result<usize> {
        self.file
            .dimension(name)
            .map(|d| d.len())
            .ok_or_else(|| format_error(self.path, format!("missing dimension {name}")))
    }

    fn variable(&self, name: &str) -> L96Result<netcdf::Variable<'_>> {
        self.file
            .variable(name)
            .ok_or_else(|| format_error(self.path, format!("missing variable {name}")))
    }

    pub fn f64_values(&self, name: &str) -> L96Result<Vec<f64>> {
        self.variable(name)?
            .get_values::<f64, _>(..)
            .map_err(|e| format_error(self.path, format!("variable {name}: {e}")))
    }

    pub fn u64_values(&self, name: &str) -> L96Result<Vec<u64>> {
        self.variable(name)?
            .get_values::<u64, _>(..)
            .map_err(|e| format_error(self.path, format!("variable {name}: {e}")))
    }

    fn attribute(&self, name: &str) -> L96Result<AttributeValue> {
        self.file
            .attribute(name)
            .ok_or_else(|| format_error(self.path, format!("missing global attribute {name}")))?
            .value()
            .map_err(|e| format_error(self.path, format!("global attribute {name}: {e}")))
    }

    pub fn u64_attribute(&self, name: &str) -> L96Result<u64> {
        match self.attribute(name)? {
            AttributeValue::Ulonglong(v) => Ok(v),
            AttributeValue::Ulonglongs(v) if v.len() == 1 => Ok(v[0]),
            other => Err(format_error(
                self.path,
                format!("global attribute {name} is not an unsigned 64-bit scalar: {other:?}"),
            )),
        }
    }

    pub fn usize_attribute(&self, name: &str) -> L96Result<usize> {
        let v = self.u64_attribute(name)?;
        usize::try_from(v)
            .map_err(|_| format_error(self.path, format!("global attribute {name} = {v} out of range")))
    }

    pub fn f64_attribute(&self, name: &str) -> L96Result<f64> {
        match self.attribute(name)? {
            AttributeValue::Double(v) => Ok(v),
            AttributeValue::Doubles(v) if v.len() == 1 => Ok(v[0]),
            other => Err(format_error(
                self.path,
                format!("global attribute {name} is not a double scalar: {other:?}"),
            )),
        }
    }

    pub fn str_attribute(&self, name: &str) -> L96Result<String> {
        match self.attribute(name)? {
            AttributeValue::Str(s) => Ok(s),
            other => Err(format_error(
                self.path,
                format!("global attribute {name} is not text: {other:?}"),
            )),
        }
    }

    pub fn format_error(&self, what: impl std::fmt::Display) -> L96Error {
        format_error(self.path, what)
    }
}
