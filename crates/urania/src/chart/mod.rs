pub mod assembler;
pub mod types;

pub use assembler::{house_of, ChartAssembler};
pub use types::{
    degree_in_sign, ChartAngles, ChartMoment, ChartSnapshot, HouseCusp, PlanetPosition, ZodiacSign,
};

use crate::ephemeris::EphemerisSource;
use crate::error::ChartError;
use crate::houses;

/// Full chart computation for one moment: positions, angles, cusps,
/// assembly. This is the path both natal charts and derived charts take.
pub fn compute(
    source: &mut dyn EphemerisSource,
    assembler: &ChartAssembler,
    moment: ChartMoment,
) -> Result<ChartSnapshot, ChartError> {
    moment.location.validate()?;

    let positions = source.positions(moment.instant, &moment.location)?;
    let angles = houses::compute_angles(moment.instant, &moment.location);
    let cusps = houses::cusps(
        angles.ascendant,
        angles.midheaven,
        moment.location.latitude,
        moment.house_system,
    )?;

    assembler.assemble(
        moment,
        &positions,
        &cusps,
        ChartAngles::from_asc_mc(angles.ascendant, angles.midheaven),
    )
}
