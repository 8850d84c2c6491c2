//! Relative and absolute wrap parameters

use crate::error::{Result, StagingError};
use serde::{Deserialize, Serialize};

/// Scale-invariant wrap parameters. Both values are divided into the
/// bounding diagonal of the input, so smaller values mean a coarser,
/// looser wrap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryParams {
    relative_alpha: f32,
    relative_offset: f32,
}

/// Parameters in input units, derived from [`GeometryParams`] and the
/// bounding diagonal of a processed point set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbsoluteParams {
    pub alpha: f32,
    pub offset: f32,
    pub diagonal: f32,
}

impl GeometryParams {
    /// Validate and build relative parameters
    pub fn new(relative_alpha: f32, relative_offset: f32) -> Result<Self> {
        check("relative_alpha", relative_alpha)?;
        check("relative_offset", relative_offset)?;
        Ok(Self {
            relative_alpha,
            relative_offset,
        })
    }

    pub fn relative_alpha(&self) -> f32 {
        self.relative_alpha
    }

    pub fn relative_offset(&self) -> f32 {
        self.relative_offset
    }

    /// Scale to absolute parameters. The diagonal must be finite and
    /// positive; anything else means the input cannot be wrapped.
    pub fn absolute(&self, diagonal: f32) -> Result<AbsoluteParams> {
        if !diagonal.is_finite() || diagonal <= 0.0 {
            return Err(StagingError::EmptyOrDegenerateInput(format!(
                "bounding diagonal {} is not a finite positive length",
                diagonal
            )));
        }

        let params = AbsoluteParams {
            alpha: diagonal / self.relative_alpha,
            offset: diagonal / self.relative_offset,
            diagonal,
        };

        // Tiny relative values can still overflow the division
        if !params.alpha.is_finite() || !params.offset.is_finite() {
            return Err(StagingError::EmptyOrDegenerateInput(format!(
                "absolute parameters overflow (alpha {}, offset {})",
                params.alpha, params.offset
            )));
        }

        Ok(params)
    }
}

fn check(name: &'static str, value: f32) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(StagingError::InvalidParameter { name, value });
    }
    Ok(())
}
