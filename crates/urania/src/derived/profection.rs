//! Annual profections: the active house rotates by one sign per year of
//! life. Pure arithmetic on the natal chart, no ephemeris call.

use serde::{Deserialize, Serialize};

use crate::chart::{ChartSnapshot, ZodiacSign};
use crate::ephemeris::Planet;
use crate::error::ChartError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Profection {
    pub age: u32,
    /// Profected house, 1-12. Age 0 activates house 1.
    pub house: u8,
    /// Sign on the profected house cusp.
    pub sign: ZodiacSign,
    /// Traditional ruler of that sign, the "lord of the year".
    pub year_lord: Planet,
}

/// The profection for a given age in years.
pub fn annual_profection(natal: &ChartSnapshot, age: u32) -> Result<Profection, ChartError> {
    let house = ((age % 12) + 1) as u8;
    let cusp = natal.cusp(house).ok_or_else(|| {
        ChartError::computation("profection", format!("natal chart has no cusp {house}"))
    })?;
    Ok(Profection {
        age,
        house,
        sign: cusp.sign,
        year_lord: cusp.sign.traditional_ruler(),
    })
}
