//! Built-in sample project
//!
//! A two-storey office building with the usual labor and material prices,
//! a set of standard unit-price analyses and a complete budget. Used by
//! `rab init` and by tests.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::json;

use crate::models::{
    BudgetTree, Division, LineItem, ProjectInfo, Recipe, RecipeComponent, Resource, SubDivision,
};
use crate::project::Project;

const RESOURCES: &[(&str, &str, &str, &str, f64)] = &[
    ("L.01", "Upah", "Pekerja", "OH", 107000.0),
    ("L.02.1", "Upah", "Tukang Batu", "OH", 110000.0),
    ("L.02.2", "Upah", "Tukang Kayu", "OH", 110000.0),
    ("L.02.3", "Upah", "Tukang Besi", "OH", 110000.0),
    ("L.02.4", "Upah", "Tukang Cat", "OH", 110000.0),
    ("L.02.5", "Upah", "Tukang Listrik", "OH", 110000.0),
    ("L.02.6", "Upah", "Tukang Pipa", "OH", 110000.0),
    ("L.02.7", "Upah", "Tukang Alumunium", "OH", 110000.0),
    ("L.03", "Upah", "Kepala Tukang", "OH", 120000.0),
    ("L.04", "Upah", "Mandor", "OH", 125000.0),
    ("M.01", "Bahan", "Semen Portland (PC)", "Kg", 1516.0),
    ("M.01b", "Bahan", "Semen Mortar", "Kg", 2500.0),
    ("M.02", "Bahan", "Pasir Beton", "Kg", 1000.0),
    ("M.03", "Bahan", "Pasir Pasang", "M3", 132500.0),
    ("M.03b", "Bahan", "Pasir Urug", "M3", 90000.0),
    ("M.04", "Bahan", "Kerikil / Split", "Kg", 1000.0),
    ("M.05", "Bahan", "Batu Belah", "M3", 300000.0),
    ("M.06", "Bahan", "Bata Merah", "Bh", 1000.0),
    ("M.07", "Bahan", "Bata Ringan (Hebel)", "Bh", 8500.0),
    ("M.07b", "Bahan", "Batako", "Bh", 2500.0),
    ("M.07c", "Bahan", "Roster Beton", "Bh", 15000.0),
    ("M.08", "Bahan", "Besi Beton Polos", "Kg", 10900.0),
    ("M.09", "Bahan", "Kawat Beton", "Kg", 15000.0),
    ("M.10", "Bahan", "Paku Campur", "Kg", 25000.0),
    ("M.11", "Bahan", "Kayu Papan Bekisting", "M3", 2407000.0),
    ("M.12", "Bahan", "Kayu Kaso 5/7", "M3", 1800000.0),
    ("M.13", "Bahan", "Multiplek 9mm", "Lbr", 125000.0),
    ("M.14", "Bahan", "Minyak Bekisting", "Liter", 43300.0),
    ("M.15", "Bahan", "Keramik 30x30", "M2", 65000.0),
    ("M.15b", "Bahan", "Keramik 40x40", "M2", 75000.0),
    ("M.15c", "Bahan", "Keramik 60x60", "M2", 120000.0),
    ("M.16", "Bahan", "Semen Warna", "Kg", 20000.0),
    ("M.17", "Bahan", "Cat Tembok Interior", "Kg", 50000.0),
    ("M.17b", "Bahan", "Cat Tembok Eksterior", "Kg", 75000.0),
    ("M.17c", "Bahan", "Cat Plafon", "Kg", 45000.0),
    ("M.18", "Bahan", "Plamir", "Kg", 15000.0),
    ("M.19", "Bahan", "Gypsum Board 9mm", "Lbr", 85000.0),
    ("M.20", "Bahan", "Hollow Galvalum 4x4", "Btg", 25000.0),
    ("M.21", "Bahan", "Baja Ringan C75.75", "Btg", 75000.0),
    ("M.22", "Bahan", "Reng Baja Ringan", "Btg", 35000.0),
    ("M.23", "Bahan", "Atap Metal Berpasir", "M2", 45000.0),
    ("M.24", "Bahan", "Seng Gelombang", "Lbr", 50000.0),
    ("M.25", "Bahan", "Pintu UPVC Lengkap", "Unit", 500000.0),
    ("M.26", "Bahan", "Kusen Aluminium 4\"", "M", 100000.0),
    ("M.27", "Bahan", "Kaca Polos 5mm", "M2", 120000.0),
    ("M.28", "Bahan", "Engsel Pintu", "Bh", 25000.0),
    ("E.01", "Bahan", "Kabel NYM 3x2.5mm", "M", 12000.0),
    ("E.02", "Bahan", "Saklar Tunggal", "Bh", 29000.0),
    ("E.03", "Bahan", "Stop Kontak", "Bh", 27200.0),
    ("E.04", "Bahan", "Lampu LED 14W", "Bh", 46681.0),
    ("E.05", "Bahan", "Pipa Conduit", "Btg", 8000.0),
    ("P.01", "Bahan", "Pipa PVC 3/4\"", "Btg", 40000.0),
    ("P.02", "Bahan", "Pipa PVC 4\"", "Btg", 120000.0),
    ("P.03", "Bahan", "Kloset Jongkok", "Bh", 500000.0),
];

const RECIPES: &[(&str, &str, &str, &[(&str, f64)])] = &[
    ("AHSP.PS.01", "Pagar Sementara Seng", "m", &[("L.01", 0.4), ("L.02.2", 0.2), ("M.12", 0.015), ("M.24", 1.2), ("M.10", 0.05)]),
    ("AHSP.T.01", "Galian Tanah Manual", "m3", &[("L.01", 0.75), ("L.04", 0.025)]),
    ("AHSP.S.01", "Beton K-200 (Manual)", "m3", &[("L.01", 1.65), ("L.02.1", 0.275), ("M.01", 352.0), ("M.02", 731.0), ("M.04", 1031.0)]),
    ("AHSP.S.02", "Pembesian Besi Polos", "kg", &[("L.01", 0.007), ("L.02.3", 0.007), ("M.08", 1.05), ("M.09", 0.015)]),
    ("AHSP.S.03", "Pasang Bekisting", "m2", &[("L.01", 0.66), ("L.02.2", 0.33), ("M.11", 0.04), ("M.13", 0.35), ("M.14", 0.1)]),
    ("AHSP.S.04", "Pondasi Batu Belah 1:5", "m3", &[("L.01", 1.5), ("L.02.1", 0.75), ("M.05", 1.2), ("M.01", 136.0), ("M.03", 0.544)]),
    ("AHSP.A.01", "Pas. Bata Merah 1:5", "m2", &[("L.01", 0.3), ("L.02.1", 0.1), ("M.06", 70.0), ("M.01", 9.68), ("M.03", 0.045)]),
    ("AHSP.A.01b", "Pas. Bata Ringan", "m2", &[("L.01", 0.2), ("L.02.1", 0.1), ("M.07", 8.5), ("M.01b", 4.0)]),
    ("AHSP.A.01c", "Pas. Dinding Roster", "m2", &[("L.01", 0.3), ("L.02.1", 0.15), ("M.07c", 25.0), ("M.01", 11.0)]),
    ("AHSP.A.02", "Plesteran 1:5", "m2", &[("L.01", 0.3), ("L.02.1", 0.15), ("M.01", 6.24), ("M.03", 0.024)]),
    ("AHSP.A.03", "Acian Semen", "m2", &[("L.01", 0.2), ("L.02.1", 0.1), ("M.01", 3.25)]),
    ("AHSP.A.04", "Pas. Keramik 30x30", "m2", &[("L.01", 0.7), ("L.02.1", 0.35), ("M.15", 1.05), ("M.01", 10.0), ("M.16", 1.5)]),
    ("AHSP.A.04b", "Pas. Keramik 40x40", "m2", &[("L.01", 0.65), ("L.02.1", 0.35), ("M.15b", 1.05), ("M.01", 10.0), ("M.16", 1.5)]),
    ("AHSP.A.04c", "Pas. Keramik 60x60", "m2", &[("L.01", 0.6), ("L.02.1", 0.35), ("M.15c", 1.05), ("M.01", 9.0), ("M.16", 1.5)]),
    ("AHSP.PL.01", "Plafon Hollow+Gypsum", "m2", &[("L.02.2", 0.35), ("M.19", 1.1), ("M.20", 3.0), ("M.10", 0.1)]),
    ("AHSP.CAT.01", "Cat Dinding Interior", "m2", &[("L.01", 0.02), ("L.02.4", 0.063), ("M.17", 0.26), ("M.18", 0.1)]),
    ("AHSP.CAT.02", "Cat Dinding Eksterior", "m2", &[("L.01", 0.03), ("L.02.4", 0.07), ("M.17b", 0.26), ("M.18", 0.1)]),
    ("AHSP.M.01", "Titik Lampu", "ttk", &[("L.01", 0.5), ("L.02.5", 0.5), ("E.01", 12.0), ("E.05", 3.0)]),
    ("AHSP.P.01", "Pasang Kloset Jongkok", "bh", &[("L.02.1", 1.5), ("P.03", 1.0), ("M.01", 6.0)]),
    ("AHSP.P.02", "Instalasi Air Bersih", "m", &[("L.02.6", 0.15), ("P.01", 1.2)]),
];

const BUDGET: &[(&str, &str, &[(&str, &str, &[(&str, &str, f64, Option<&str>, f64)])])] = &[
    (
        "A",
        "PEKERJAAN PERSIAPAN",
        &[
            (
                "A.1",
                "Pekerjaan Pembersihan",
                &[
                    ("Pembersihan & Kupasan Lahan", "M2", 200.0, None, 12457.5),
                    ("Tebas Tebang Tanaman", "M2", 200.0, None, 3943.5),
                    ("Cabut Tunggul Pohon", "Bh", 10.0, None, 152903.0),
                ],
            ),
            (
                "A.2",
                "Pekerjaan Bongkaran",
                &[
                    ("Bongkaran Batu Belah", "M3", 27.0, None, 152515.0),
                    ("Bongkar Beton Manual", "M3", 10.8, None, 168327.0),
                    ("Bongkaran Dinding Bata", "M3", 18.0, None, 21367.5),
                    ("Bongkaran Atap", "M2", 45.0, None, 13538.8),
                ],
            ),
            (
                "A.3",
                "Fasilitas Sementara",
                &[
                    ("Pagar Seng Gelombang t=2m", "M'", 90.0, Some("AHSP.PS.01"), 0.0),
                    ("Direksi Keet / Gudang", "M2", 15.0, None, 330678.0),
                    ("Papan Nama Proyek", "Bh", 1.0, None, 373642.0),
                    ("Bouwplank / Pengukuran", "M'", 95.5, None, 17782.6),
                ],
            ),
        ],
    ),
    (
        "B",
        "PEKERJAAN STRUKTUR BAWAH",
        &[
            (
                "B.1",
                "Pekerjaan Tanah",
                &[
                    ("Galian Tanah Pondasi", "M3", 45.2, Some("AHSP.T.01"), 0.0),
                    ("Urukan Pasir Bawah", "M3", 5.0, None, 187500.0),
                    ("Urukan Tanah Kembali", "M3", 15.0, None, 62287.5),
                ],
            ),
            (
                "B.2",
                "Pekerjaan Pondasi",
                &[
                    ("Pondasi Batu Belah 1:5", "M3", 54.0, Some("AHSP.S.04"), 0.0),
                    ("Footplat Beton (K-200)", "M3", 15.0, Some("AHSP.S.01"), 0.0),
                    ("Pembesian Footplat", "Kg", 1800.0, Some("AHSP.S.02"), 0.0),
                    ("Sloof Beton 20x30", "M3", 9.0, Some("AHSP.S.01"), 0.0),
                    ("Pembesian Sloof", "Kg", 1250.0, Some("AHSP.S.02"), 0.0),
                    ("Bekisting Sloof", "M2", 84.4, Some("AHSP.S.03"), 0.0),
                ],
            ),
        ],
    ),
    (
        "C",
        "PEKERJAAN STRUKTUR ATAS",
        &[
            (
                "C.1",
                "Struktur Lantai 1",
                &[
                    ("Kolom K1 (40x40)", "M3", 5.6, Some("AHSP.S.01"), 0.0),
                    ("Bekisting Kolom K1", "M2", 63.0, Some("AHSP.S.03"), 0.0),
                    ("Pembesian Kolom K1", "Kg", 12557.0, Some("AHSP.S.02"), 0.0),
                    ("Balok B1 (30x50)", "M3", 12.0, Some("AHSP.S.01"), 0.0),
                    ("Bekisting Balok B1", "M2", 166.5, Some("AHSP.S.03"), 0.0),
                    ("Plat Lantai 2 (12cm)", "M3", 7.92, Some("AHSP.S.01"), 0.0),
                ],
            ),
            (
                "C.2",
                "Struktur Lantai 2 & Atap",
                &[
                    ("Kolom K1 Lt.2", "M3", 5.6, Some("AHSP.S.01"), 0.0),
                    ("Ring Balok", "M3", 19.75, Some("AHSP.S.01"), 0.0),
                    ("Kolom Praktis", "M3", 1.5, Some("AHSP.S.01"), 0.0),
                    ("Tangga Beton", "M3", 2.04, Some("AHSP.S.01"), 0.0),
                    ("Pembesian Str Lt.2", "Kg", 12272.0, Some("AHSP.S.02"), 0.0),
                ],
            ),
        ],
    ),
    (
        "D",
        "PEKERJAAN ARSITEKTUR",
        &[
            (
                "D.1",
                "Dinding",
                &[
                    ("Pas. Bata Merah Lt.1", "M2", 150.5, Some("AHSP.A.01"), 0.0),
                    ("Pas. Bata Merah Lt.2", "M2", 109.5, Some("AHSP.A.01"), 0.0),
                    ("Plesteran Dinding", "M2", 518.0, Some("AHSP.A.02"), 0.0),
                    ("Acian Dinding", "M2", 518.0, Some("AHSP.A.03"), 0.0),
                    ("Dinding Roster", "M2", 20.0, Some("AHSP.A.01c"), 0.0),
                ],
            ),
            (
                "D.2",
                "Lantai & Dinding",
                &[
                    ("Lantai Keramik 30x30", "M2", 85.0, Some("AHSP.A.04"), 0.0),
                    ("Lantai Keramik 40x40", "M2", 33.0, Some("AHSP.A.04b"), 0.0),
                    ("Lantai Keramik 60x60", "M2", 28.0, Some("AHSP.A.04c"), 0.0),
                    ("Plint Keramik", "M'", 80.0, None, 44620.0),
                ],
            ),
            (
                "D.3",
                "Plafon",
                &[
                    ("Rangka+Plafon Gypsum", "M2", 92.0, Some("AHSP.PL.01"), 0.0),
                    ("List Plafon", "M'", 95.5, None, 18782.0),
                ],
            ),
            (
                "D.4",
                "Pintu & Jendela",
                &[
                    ("Kusen Aluminium 4\"", "M'", 32.0, None, 154589.0),
                    ("Daun Pintu UPVC", "Bh", 6.0, None, 592860.0),
                    ("Jendela Kaca Frame Alu", "M2", 4.3, None, 327360.0),
                    ("Kaca Polos 5mm", "M2", 20.0, None, 73183.0),
                    ("Engsel Pintu", "Bh", 18.0, None, 44583.0),
                    ("Kunci Tanam", "Bh", 6.0, None, 112332.0),
                ],
            ),
            (
                "D.5",
                "Pengecatan",
                &[
                    ("Cat Dinding Interior", "M2", 301.0, Some("AHSP.CAT.01"), 0.0),
                    ("Cat Dinding Eksterior", "M2", 100.0, Some("AHSP.CAT.02"), 0.0),
                    ("Cat Plafon", "M2", 92.0, None, 32539.0),
                ],
            ),
        ],
    ),
    (
        "E",
        "MEKANIKAL & ELEKTRIKAL",
        &[
            (
                "E.1",
                "Armatur Lampu",
                &[
                    ("Downlight 5 Inch LED", "Unit", 10.0, None, 46681.8),
                    ("Fitting E27 + LED", "Unit", 25.0, None, 70881.8),
                    ("Lampu Sorot LED 100W", "Unit", 2.0, None, 69132.8),
                    ("Lampu Taman+Tiang", "Unit", 18.0, None, 101139.0),
                    ("Lampu PJU Kawasan", "Unit", 18.0, None, 738614.0),
                ],
            ),
            (
                "E.2",
                "Instalasi",
                &[
                    ("Instalasi Lampu", "Titik", 100.0, Some("AHSP.M.01"), 0.0),
                    ("Instalasi Lampu Taman", "Titik", 10.0, None, 258126.0),
                    ("Instalasi PJU", "Titik", 4.0, None, 421476.0),
                ],
            ),
            (
                "E.3",
                "Saklar & Stop Kontak",
                &[
                    ("Saklar Tunggal", "Unit", 20.0, None, 29025.7),
                    ("Saklar Ganda", "Unit", 20.0, None, 29025.7),
                    ("Stop Kontak", "Unit", 30.0, None, 27199.7),
                    ("MCB Box", "Unit", 4.0, None, 489802.0),
                ],
            ),
            (
                "E.4",
                "Tata Udara (AC)",
                &[
                    ("AC Split 1/2 PK", "Unit", 4.0, None, 871138.0),
                    ("AC Split 1 PK", "Unit", 3.0, None, 917060.0),
                    ("Stop Kontak AC", "Unit", 6.0, None, 37483.0),
                ],
            ),
        ],
    ),
    (
        "F",
        "PLUMBING & SANITAIR",
        &[
            (
                "F.1",
                "Sanitair",
                &[
                    ("Closet Duduk", "Bh", 2.0, None, 885390.0),
                    ("Closet Jongkok", "Bh", 1.0, Some("AHSP.P.01"), 0.0),
                    ("Floor Drain", "Bh", 6.0, None, 37050.0),
                    ("Kran Air 1/2", "Bh", 10.0, None, 78960.0),
                    ("Jet Washer", "Bh", 4.0, None, 67960.0),
                ],
            ),
            (
                "F.2",
                "Perpipaan & Pompa",
                &[
                    ("Pipa PVC AW 1/2\"", "M'", 20.0, None, 37822.0),
                    ("Pipa PVC AW 3/4\"", "M'", 10.0, Some("AHSP.P.02"), 0.0),
                    ("Pipa PVC D 4\" (Kotor)", "M'", 20.0, None, 89736.0),
                    ("Pompa Transfer", "Bh", 2.0, None, 1381751.0),
                    ("Pompa Booster", "Bh", 1.0, None, 1245424.0),
                    ("Septictank & Resapan", "Ls", 1.0, None, 3500000.0),
                ],
            ),
        ],
    ),
];

/// Table literal to decimal, keeping the literal's digits
fn amount(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Build the sample project, unpriced (call `recompute` before reading totals)
pub fn sample_project() -> Project {
    let mut info = ProjectInfo::new();
    info.insert("name".into(), json!("Pembangunan Gedung Operasional"));
    info.insert("location".into(), json!("Bandung, Jawa Barat"));
    info.insert("year".into(), json!("2025"));
    info.insert("owner".into(), json!("OM RIO"));
    info.insert("consultant".into(), json!("SMARTSTUDIO"));
    info.insert("contractor".into(), json!("SMARTSTUDIO KONTRAKTOR"));

    let mut project = Project::new(info);

    for &(id, category, name, unit, price) in RESOURCES {
        project.catalog.upsert(Resource {
            id: id.to_string(),
            category: category.to_string(),
            name: name.to_string(),
            unit: unit.to_string(),
            price: amount(price),
        });
    }

    for &(id, name, unit, components) in RECIPES {
        project.library.upsert(Recipe {
            id: id.to_string(),
            name: name.to_string(),
            unit: unit.to_string(),
            components: components
                .iter()
                .map(|&(resource_id, coefficient)| RecipeComponent::new(resource_id, amount(coefficient)))
                .collect(),
        });
    }

    project.budget = BudgetTree {
        divisions: BUDGET
            .iter()
            .map(|&(id, title, subs)| {
                let mut division = Division::new(id, title);
                division.subdivisions = subs
                    .iter()
                    .map(|&(sub_id, sub_title, items)| {
                        let mut sub = SubDivision::new(sub_id, sub_title);
                        sub.items = items.iter().map(sample_item).collect();
                        sub
                    })
                    .collect();
                division
            })
            .collect(),
    };

    project
}

fn sample_item(&(name, unit, volume, recipe, manual_price): &(&str, &str, f64, Option<&str>, f64)) -> LineItem {
    let mut item = LineItem::manual(name, unit, amount(volume), amount(manual_price));
    if let Some(recipe_id) = recipe {
        item.attach_recipe(recipe_id);
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_has_six_divisions_and_every_reference_resolves() {
        let project = sample_project();
        assert_eq!(project.budget.divisions.len(), 6);
        assert_eq!(project.catalog.len(), RESOURCES.len());
        assert_eq!(project.library.len(), RECIPES.len());
        assert!(project.dangling_references().is_empty());
    }

    #[test]
    fn excavation_recipe_price() {
        let project = sample_project();
        // 0.75 x 107000 + 0.025 x 125000
        assert_eq!(project.recipe_price("AHSP.T.01"), Decimal::from(83_375));
    }

    #[test]
    fn table_literals_convert_exactly() {
        assert_eq!(amount(0.025), Decimal::new(25, 3));
        assert_eq!(amount(17782.6), Decimal::new(177_826, 1));
        assert_eq!(amount(1516.0), Decimal::from(1516));
    }
}
