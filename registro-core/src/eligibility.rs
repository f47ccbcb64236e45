//! Rules deciding which compliance documents a vehicle has to present.
//!
//! Every comparison runs on [`normalize`]d text so that option labels match
//! regardless of case, accents or surrounding whitespace.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::model::Vehicle;

const CON_TEMPERATURA: [&str; 3] = ["con temperatura", "con_temperatura", "contemperatura"];
const CAMION: &str = "camion";
const CARRETA: &str = "carreta";

/// Lower-case, strip diacritics and trim.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_owned()
}

fn is_truck_or_trailer(vehicle: &Vehicle) -> bool {
    let unidad = normalize(&vehicle.tipo_unidad);
    unidad == CAMION || unidad == CARRETA
}

fn has_temperature_control(vehicle: &Vehicle) -> bool {
    CON_TEMPERATURA.contains(&normalize(&vehicle.temperatura).as_str())
}

/// Bonus resolution is required for bonus trailers.
#[must_use]
pub fn requires_bonificacion_doc(vehicle: &Vehicle) -> bool {
    vehicle.bonificacion && normalize(&vehicle.tipo_unidad) == CARRETA
}

/// Termoking certificate is required for temperature-controlled trucks and trailers.
#[must_use]
pub fn requires_termoking(vehicle: &Vehicle) -> bool {
    has_temperature_control(vehicle) && is_truck_or_trailer(vehicle)
}

/// Same rule as [`requires_termoking`].
#[must_use]
pub fn requires_sanipes(vehicle: &Vehicle) -> bool {
    requires_termoking(vehicle)
}

/// Fumigation certificate is required for trucks and trailers.
#[must_use]
pub fn requires_fumigacion(vehicle: &Vehicle) -> bool {
    is_truck_or_trailer(vehicle)
}

/// Same rule as [`requires_fumigacion`].
#[must_use]
pub fn requires_limpieza(vehicle: &Vehicle) -> bool {
    requires_fumigacion(vehicle)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "one independent flag per document section"
)]
/// Documents required for the current vehicle attributes.
pub struct EligibilityFlags {
    /// Bonus resolution section.
    pub res_bonificacion: bool,
    /// Termoking section.
    pub termoking: bool,
    /// SANIPES section.
    pub sanipes: bool,
    /// Fumigation section.
    pub fumigacion: bool,
    /// Cleaning and disinfection section.
    pub limpieza: bool,
}

impl EligibilityFlags {
    /// Evaluate every rule for the vehicle. Call again after each attribute change.
    #[must_use]
    pub fn for_vehicle(vehicle: &Vehicle) -> Self {
        Self {
            res_bonificacion: requires_bonificacion_doc(vehicle),
            termoking: requires_termoking(vehicle),
            sanipes: requires_sanipes(vehicle),
            fumigacion: requires_fumigacion(vehicle),
            limpieza: requires_limpieza(vehicle),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "one independent flag per dependent field"
)]
/// Vehicle form fields that only apply under a governing attribute.
///
/// Hidden fields are neither required nor persisted.
pub struct FieldVisibility {
    /// Temperature sub-type, under "Con temperatura".
    pub tipo_temperatura: bool,
    /// Free text capacity, under an "Otros" capacity.
    pub capacidad_otros: bool,
    /// Ramp length and width, under the ramp flag.
    pub rampa: bool,
    /// Bonus resolution number, under the bonus flag.
    pub nro_resolucion: bool,
}

impl FieldVisibility {
    /// Evaluate which dependent fields apply to the vehicle.
    #[must_use]
    pub fn for_vehicle(vehicle: &Vehicle) -> Self {
        let capacidad = normalize(&vehicle.capacidad);
        Self {
            tipo_temperatura: normalize(&vehicle.temperatura) == "con temperatura",
            capacidad_otros: capacidad.starts_with("otro"),
            rampa: vehicle.rampa,
            nro_resolucion: vehicle.bonificacion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(temperatura: &str, tipo_unidad: &str, bonificacion: bool) -> Vehicle {
        Vehicle {
            temperatura: temperatura.to_owned(),
            tipo_unidad: tipo_unidad.to_owned(),
            bonificacion,
            ..Vehicle::new("ABC-123")
        }
    }

    #[test]
    fn normalize_strips_accents_case_and_padding() {
        assert_eq!(normalize("  Camión "), "camion");
        assert_eq!(normalize("CARRETA"), "carreta");
        assert_eq!(normalize("Con Temperatura"), "con temperatura");
    }

    #[test]
    fn bonus_document_needs_a_bonus_trailer() {
        for unidad in ["carreta", "Carreta", "CARRETA", " carréta "] {
            assert!(requires_bonificacion_doc(&vehicle("Seco", unidad, true)), "{unidad}");
            assert!(!requires_bonificacion_doc(&vehicle("Seco", unidad, false)), "{unidad}");
        }
        for unidad in ["camion", "Camión", "furgon", ""] {
            assert!(!requires_bonificacion_doc(&vehicle("Seco", unidad, true)), "{unidad}");
        }
    }

    #[test]
    fn termoking_and_sanipes_always_agree() {
        for temperatura in ["con temperatura", "CON_TEMPERATURA", "Con Temperatura", "contemperatura"] {
            for unidad in ["camion", "Camión", "carreta"] {
                let subject = vehicle(temperatura, unidad, false);
                assert!(requires_termoking(&subject), "{temperatura}/{unidad}");
                assert_eq!(requires_termoking(&subject), requires_sanipes(&subject));
            }
        }
        for (temperatura, unidad) in [("Seco", "camion"), ("con temperatura", "furgon"), ("", "")] {
            let subject = vehicle(temperatura, unidad, false);
            assert!(!requires_termoking(&subject), "{temperatura}/{unidad}");
            assert_eq!(requires_termoking(&subject), requires_sanipes(&subject));
        }
    }

    #[test]
    fn fumigation_and_cleaning_follow_the_unit_type() {
        assert!(requires_fumigacion(&vehicle("Seco", "Camión", false)));
        assert!(requires_limpieza(&vehicle("Seco", "carreta", false)));
        assert!(!requires_fumigacion(&vehicle("Seco", "Furgoneta", false)));
        assert!(!requires_limpieza(&vehicle("Seco", "Furgoneta", false)));
    }

    #[test]
    fn dry_bonus_trailer_flags() {
        let flags = EligibilityFlags::for_vehicle(&vehicle("Seco", "Carreta", true));
        assert_eq!(
            flags,
            EligibilityFlags {
                res_bonificacion: true,
                termoking: false,
                sanipes: false,
                fumigacion: true,
                limpieza: true,
            }
        );

        let cold = EligibilityFlags::for_vehicle(&vehicle("Con temperatura", "Carreta", true));
        assert!(cold.termoking && cold.sanipes && cold.res_bonificacion);
    }

    #[test]
    fn dependent_fields_follow_their_governing_attribute() {
        let mut subject = vehicle("Con temperatura", "camion", false);
        subject.capacidad = "Otros".to_owned();
        let visible = FieldVisibility::for_vehicle(&subject);
        assert!(visible.tipo_temperatura);
        assert!(visible.capacidad_otros);
        assert!(!visible.rampa);
        assert!(!visible.nro_resolucion);

        subject.rampa = true;
        subject.bonificacion = true;
        subject.temperatura = "Seco".to_owned();
        subject.capacidad = "30 m3".to_owned();
        let visible = FieldVisibility::for_vehicle(&subject);
        assert!(!visible.tipo_temperatura);
        assert!(!visible.capacidad_otros);
        assert!(visible.rampa && visible.nro_resolucion);
    }
}
