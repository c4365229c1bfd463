//! EU certificate of conformity.
//!
//! Items are numbered (`0.1`, `16.1`, ...) and labelled in Hungarian and
//! English, usually both joined by a slash. Values share their shapes with
//! the registration certificate and land on the same vehicle codes.

use lazy_static::lazy_static;
use regex::Regex;

use super::registration::{CM3_VALUE, FUEL_VALUE, KG_VALUE, KW_VALUE, VIN_VALUE};
use super::Extracted;
use crate::models::fields::CocFields;
use crate::text::{LabelPattern, NormalizedText, Recipe, StopLabels};

/// Line-leading item label, optionally numbered, with bilingual variants
/// joined by `/` and an optional parenthesized remark.
fn item_label(names: &str) -> Result<LabelPattern, regex::Error> {
    LabelPattern::new(&format!(
        r"(?im)^\s*(?:\d+(?:\.\d+)*\.?\s*)?(?P<label>(?:{names})\b(?:\s*/\s*(?:{names})\b)*(?:\s*\([^)]*\))?)"
    ))
}

lazy_static! {
    static ref MAKE: LabelPattern = item_label(r"GY[AÁ]RTM[AÁ]NY|MAKE").unwrap();
    static ref TYPE: LabelPattern = item_label(r"T[IÍ]PUS|TYPE").unwrap();
    static ref COMMERCIAL_NAME: LabelPattern =
        item_label(r"KERESKEDELMI\s+N[EÉ]V|COMMERCIAL\s+NAMES?").unwrap();
    static ref CATEGORY: LabelPattern =
        item_label(r"J[AÁ]RM[UŰ]KATEG[OÓ]RIA|VEHICLE\s+CATEGORY").unwrap();
    static ref VIN: LabelPattern = item_label(
        r"J[AÁ]RM[UŰ]AZONOS[IÍ]T[OÓ]\s+SZ[AÁ]M|VEHICLE\s+IDENTIFICATION\s+NUMBER"
    ).unwrap();
    static ref MASS_IN_RUNNING_ORDER: LabelPattern =
        item_label(r"MENETK[EÉ]SZ\s+T[OÖ]MEG|MASS\s+IN\s+RUNNING\s+ORDER").unwrap();
    static ref MAX_LADEN_MASS: LabelPattern = item_label(
        r"M[UŰ]SZAKILAG\s+MEGENGEDETT\s+LEGNAGYOBB\s+TERHELT\s+T[OÖ]MEG|TECHNICALLY\s+PERMISSIBLE\s+MAXIMUM\s+LADEN\s+MASS"
    ).unwrap();
    static ref CAPACITY: LabelPattern =
        item_label(r"HENGER[UŰ]RTARTALOM|CAPACITY").unwrap();
    static ref FUEL: LabelPattern =
        item_label(r"[UÜ]ZEMANYAG(?:\s+T[IÍ]PUSA)?|FUEL(?:\s+TYPE)?").unwrap();
    static ref MAX_NET_POWER: LabelPattern = item_label(
        r"LEGNAGYOBB\s+HASZNOS\s+TELJES[IÍ]TM[EÉ]NY|MAXIMUM\s+NET\s+POWER"
    ).unwrap();
    static ref COLOUR: LabelPattern =
        item_label(r"SZ[IÍ]N|COLOU?R(?:\s+OF\s+VEHICLE)?").unwrap();
    static ref SEATS: LabelPattern = item_label(
        r"[UÜ]L[OŐ]HELYEK\s+SZ[AÁ]MA|NUMBER\s+OF\s+SEATING\s+POSITIONS"
    ).unwrap();

    static ref STOPS: StopLabels<'static> = StopLabels::new(vec![
        &*MAKE,
        &*TYPE,
        &*COMMERCIAL_NAME,
        &*CATEGORY,
        &*VIN,
        &*MASS_IN_RUNNING_ORDER,
        &*MAX_LADEN_MASS,
        &*CAPACITY,
        &*FUEL,
        &*MAX_NET_POWER,
        &*COLOUR,
        &*SEATS,
    ]);

    static ref ITEM_NUMBER: Regex = Regex::new(r"^\d+(?:\.\d+)*\.?$").unwrap();
}

/// A line holding nothing but an item number such as `0.2.1`.
fn is_item_number(line: &str) -> bool {
    ITEM_NUMBER.is_match(line.trim())
}

fn is_category(s: &str) -> bool {
    s.chars().any(char::is_alphabetic) && s.chars().any(|c| c.is_ascii_digit())
}

fn is_count(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) && !s.starts_with('0')
}

pub fn extract(text: &NormalizedText<'_>) -> Extracted<CocFields> {
    let lines = text.lines();
    let raw = text.raw();
    let stops: &StopLabels<'static> = &STOPS;
    let recipe =
        move |label: &'static LabelPattern| Recipe::new(label, stops).with_skip(&is_item_number);

    Extracted {
        document_number: None,
        fields: CocFields {
            make: recipe(&*MAKE).extract(lines, raw),
            vehicle_type: recipe(&*TYPE).extract(lines, raw),
            commercial_name: recipe(&*COMMERCIAL_NAME).extract(lines, raw),
            vin: recipe(&*VIN)
                .with_value(&VIN_VALUE)
                .with_fallback(&VIN_VALUE)
                .extract(lines, raw),
            max_laden_mass: recipe(&*MAX_LADEN_MASS).with_value(&KG_VALUE).extract(lines, raw),
            mass_in_running_order: recipe(&*MASS_IN_RUNNING_ORDER)
                .with_value(&KG_VALUE)
                .extract(lines, raw),
            category: recipe(&*CATEGORY).with_validator(&is_category).extract(lines, raw),
            engine_capacity: recipe(&*CAPACITY).with_value(&CM3_VALUE).extract(lines, raw),
            max_net_power: recipe(&*MAX_NET_POWER).with_value(&KW_VALUE).extract(lines, raw),
            fuel: recipe(&*FUEL).with_value(&FUEL_VALUE).extract(lines, raw),
            colour: recipe(&*COLOUR).extract(lines, raw),
            seats: recipe(&*SEATS).with_validator(&is_count).extract(lines, raw),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CERTIFICATE: &str = "\
EK MEGFELELŐSÉGI NYILATKOZAT
0.1 Gyártmány / Make: VOLKSWAGEN
0.2 Típus / Type: AU
0.2.1 Kereskedelmi név / Commercial name: GOLF
0.4 Járműkategória / Vehicle category: M1
0.10 Járműazonosító szám / Vehicle identification number:
WVWZZZAUZFW000001
13. Menetkész tömeg / Mass in running order: 1320 kg
16.1 Műszakilag megengedett legnagyobb terhelt tömeg / Technically permissible maximum laden mass: 1820 kg
25. Hengerűrtartalom / Capacity: 1395 cm3
26. Üzemanyag / Fuel: BENZIN
27.1 Legnagyobb hasznos teljesítmény / Maximum net power: 92 kW
38. Szín / Colour: FEHÉR
42. Ülőhelyek száma / Number of seating positions: 5
";

    fn run(text: &str) -> Extracted<CocFields> {
        extract(&NormalizedText::new(text))
    }

    #[test]
    fn test_full_certificate() {
        let got = run(CERTIFICATE);
        assert_eq!(got.document_number, None);
        let f = got.fields;
        assert_eq!(f.make.as_deref(), Some("VOLKSWAGEN"));
        assert_eq!(f.vehicle_type.as_deref(), Some("AU"));
        assert_eq!(f.commercial_name.as_deref(), Some("GOLF"));
        assert_eq!(f.category.as_deref(), Some("M1"));
        assert_eq!(f.vin.as_deref(), Some("WVWZZZAUZFW000001"));
        assert_eq!(f.mass_in_running_order.as_deref(), Some("1320 kg"));
        assert_eq!(f.max_laden_mass.as_deref(), Some("1820 kg"));
        assert_eq!(f.engine_capacity.as_deref(), Some("1395 cm3"));
        assert_eq!(f.fuel.as_deref(), Some("BENZIN"));
        assert_eq!(f.max_net_power.as_deref(), Some("92 kW"));
        assert_eq!(f.colour.as_deref(), Some("FEHÉR"));
        assert_eq!(f.seats.as_deref(), Some("5"));
    }

    #[test]
    fn test_item_number_lines_are_skipped() {
        let got = run("Gyártmány\n0.1\nOPEL\nTípus\n0.2\nASTRA-K");
        assert_eq!(got.fields.make.as_deref(), Some("OPEL"));
        assert_eq!(got.fields.vehicle_type.as_deref(), Some("ASTRA-K"));
    }

    #[test]
    fn test_vin_without_label() {
        let got = run("some page\nW0L0AHL3555555555 stamped");
        assert_eq!(got.fields.vin.as_deref(), Some("W0L0AHL3555555555"));
    }

    #[test]
    fn test_next_label_blocks_value() {
        let got = run("Szín\nÜlőhelyek száma: 5");
        assert_eq!(got.fields.colour, None);
        assert_eq!(got.fields.seats.as_deref(), Some("5"));
    }
}
