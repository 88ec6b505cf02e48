//! One-page A4 service certificate, drawn with `lopdf`.
//!
//! Text uses the standard Type1 Helvetica faces with WinAnsiEncoding, so
//! no font program is embedded. Characters outside Latin-1 are replaced
//! with `?`.

use chrono::{DateTime, Utc};
use doccon_core::models::certificate::Certificate;
use doccon_core::models::doctor::DoctorSummary;
use doccon_core::models::hospital::HospitalSummary;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::error::CertError;

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 36;

/// Everything printed on a certificate.
#[derive(Debug, Clone)]
pub struct CertificateContent {
    pub certificate_number: String,
    pub issue_date: DateTime<Utc>,
    pub doctor_name: String,
    pub license_number: String,
    pub specialization: String,
    pub hospital_name: String,
    /// Address, city and state on one line.
    pub hospital_location: String,
    pub service_period: String,
    pub department: String,
    pub total_hours: u32,
}

impl CertificateContent {
    /// Content of an already issued certificate, for re-rendering.
    pub fn for_certificate(
        certificate: &Certificate,
        doctor: &DoctorSummary,
        hospital: &HospitalSummary,
    ) -> Self {
        Self {
            certificate_number: certificate.certificate_number.clone(),
            issue_date: certificate.issue_date,
            doctor_name: doctor.name.clone(),
            license_number: doctor.license_number.clone(),
            specialization: doctor.specialization.to_string(),
            hospital_name: hospital.name.clone(),
            hospital_location: hospital_location(hospital),
            service_period: certificate.service_period.clone(),
            department: certificate.department.to_string(),
            total_hours: certificate.total_hours,
        }
    }
}

pub fn hospital_location(hospital: &HospitalSummary) -> String {
    hospital
        .address
        .iter()
        .map(String::as_str)
        .chain([hospital.city.as_str(), hospital.state.as_str()])
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render the certificate and return the PDF bytes.
pub fn render_certificate(content: &CertificateContent) -> Result<Vec<u8>, CertError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let content_id = doc.add_object(Stream::new(dictionary! {}, page_content(content).encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

fn page_content(c: &CertificateContent) -> Content {
    let mut ops = vec![
        // Double frame.
        Operation::new("w", vec![2.into()]),
        Operation::new(
            "re",
            vec![
                MARGIN.into(),
                MARGIN.into(),
                (PAGE_WIDTH - 2 * MARGIN).into(),
                (PAGE_HEIGHT - 2 * MARGIN).into(),
            ],
        ),
        Operation::new("S", vec![]),
        Operation::new("w", vec![1.into()]),
        Operation::new(
            "re",
            vec![
                (MARGIN + 8).into(),
                (MARGIN + 8).into(),
                (PAGE_WIDTH - 2 * MARGIN - 16).into(),
                (PAGE_HEIGHT - 2 * MARGIN - 16).into(),
            ],
        ),
        Operation::new("S", vec![]),
    ];

    let mut y = 740;
    centered(&mut ops, "F2", 26, y, "CERTIFICATE OF SERVICE");
    y -= 28;
    centered(&mut ops, "F1", 12, y, "Doctor Connect Volunteer Program");

    y -= 40;
    centered(
        &mut ops,
        "F1",
        11,
        y,
        &format!("Certificate No: {}", c.certificate_number),
    );
    y -= 18;
    centered(
        &mut ops,
        "F1",
        11,
        y,
        &format!("Issue Date: {}", c.issue_date.format("%B %-d, %Y")),
    );

    y -= 50;
    centered(&mut ops, "F1", 13, y, "This is to certify that");
    y -= 32;
    centered(&mut ops, "F2", 22, y, &format!("Dr. {}", c.doctor_name));
    y -= 22;
    centered(
        &mut ops,
        "F1",
        11,
        y,
        &format!("License No: {}  |  {}", c.license_number, c.specialization),
    );

    y -= 40;
    centered(&mut ops, "F1", 13, y, "has rendered volunteer medical service at");
    y -= 28;
    centered(&mut ops, "F2", 17, y, &c.hospital_name);
    if !c.hospital_location.is_empty() {
        y -= 20;
        centered(&mut ops, "F1", 11, y, &c.hospital_location);
    }

    y -= 50;
    for (label, value) in [
        ("Department", c.department.clone()),
        ("Service Period", c.service_period.clone()),
        ("Total Service Hours", c.total_hours.to_string()),
    ] {
        text(&mut ops, "F2", 12, 150, y, &format!("{label}:"));
        text(&mut ops, "F1", 12, 300, y, &value);
        y -= 22;
    }

    y -= 30;
    centered(
        &mut ops,
        "F1",
        11,
        y,
        "In recognition of dedication and service to the community.",
    );

    text(&mut ops, "F1", 11, 110, 150, "______________________");
    text(&mut ops, "F1", 10, 130, 134, "Program Administrator");
    text(&mut ops, "F1", 11, 340, 150, "______________________");
    text(&mut ops, "F1", 10, 365, 134, "Hospital Authority");

    centered(
        &mut ops,
        "F1",
        9,
        70,
        &format!("Verification Code: {}", c.certificate_number),
    );

    Content { operations: ops }
}

fn text(ops: &mut Vec<Operation>, font: &str, size: i64, x: i64, y: i64, s: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(win_ansi(s))]));
    ops.push(Operation::new("ET", vec![]));
}

/// Approximate centering: Helvetica glyphs average about half the font
/// size in width.
fn centered(ops: &mut Vec<Operation>, font: &str, size: i64, y: i64, s: &str) {
    let width = s.chars().count() as i64 * size / 2;
    let x = ((PAGE_WIDTH - width) / 2).max(MARGIN + 12);
    text(ops, font, size, x, y, s);
}

fn win_ansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
