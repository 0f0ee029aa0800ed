//! Projection of a data set's clinical attributes to a flat,
//! JSON-serializable record.
//!
//! Absent attributes are omitted from the serialized output rather
//! than emitted as nulls. Textual values keep the character data as
//! stored, minus trailing space and NUL padding; decimal-string
//! attributes (rescale and windowing) are passed through untouched
//! since they may be multi-valued.
use minidicom_core::tags;
use minidicom_parser::DataSet;
use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_instance_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bits_allocated: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bits_stored: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples_per_pixel: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photometric_interpretation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rescale_intercept: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rescale_slope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_center: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_width: Option<String>,
}

impl Metadata {
    /// Collect the projected attributes from a parsed data set.
    pub fn from_dataset(dataset: &DataSet<'_>) -> Self {
        Metadata {
            patient_name: dataset.get_string(tags::PATIENT_NAME),
            patient_id: dataset.get_string(tags::PATIENT_ID),
            patient_birth_date: dataset.get_string(tags::PATIENT_BIRTH_DATE),
            patient_sex: dataset.get_string(tags::PATIENT_SEX),
            study_instance_uid: dataset.get_string(tags::STUDY_INSTANCE_UID),
            study_date: dataset.get_string(tags::STUDY_DATE),
            study_time: dataset.get_string(tags::STUDY_TIME),
            study_description: dataset.get_string(tags::STUDY_DESCRIPTION),
            rows: dataset.get_u16(tags::ROWS),
            columns: dataset.get_u16(tags::COLUMNS),
            bits_allocated: dataset.get_u16(tags::BITS_ALLOCATED),
            bits_stored: dataset.get_u16(tags::BITS_STORED),
            samples_per_pixel: dataset.get_u16(tags::SAMPLES_PER_PIXEL),
            photometric_interpretation: dataset.get_string(tags::PHOTOMETRIC_INTERPRETATION),
            rescale_intercept: dataset.get_string(tags::RESCALE_INTERCEPT),
            rescale_slope: dataset.get_string(tags::RESCALE_SLOPE),
            window_center: dataset.get_string(tags::WINDOW_CENTER),
            window_width: dataset.get_string(tags::WINDOW_WIDTH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minidicom_core::Tag;
    use minidicom_encoding::Endianness;

    fn element(tag: Tag, vr: &[u8; 2], value: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&tag.group().to_le_bytes());
        out.extend_from_slice(&tag.element().to_le_bytes());
        out.extend_from_slice(vr);
        out.extend_from_slice(&(value.len() as u16).to_le_bytes());
        out.extend_from_slice(value);
        out
    }

    #[test]
    fn absent_attributes_are_omitted() {
        let mut data = Vec::new();
        data.extend(element(tags::PATIENT_NAME, b"PN", b"DOE^JANE"));
        data.extend(element(tags::ROWS, b"US", &32u16.to_le_bytes()));
        let dataset = DataSet::parse(&data, 0, true, Endianness::Little).unwrap();

        let metadata = Metadata::from_dataset(&dataset);
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&metadata).unwrap()).unwrap();
        assert_eq!(json["patientName"], "DOE^JANE");
        assert_eq!(json["rows"], 32);
        assert!(json.get("studyDate").is_none());
        assert!(json.get("windowCenter").is_none());
    }

    #[test]
    fn decimal_strings_pass_through() {
        let mut data = Vec::new();
        data.extend(element(tags::WINDOW_CENTER, b"DS", b"40\\400 "));
        data.extend(element(tags::RESCALE_SLOPE, b"DS", b"1 "));
        let dataset = DataSet::parse(&data, 0, true, Endianness::Little).unwrap();

        let metadata = Metadata::from_dataset(&dataset);
        assert_eq!(metadata.window_center.as_deref(), Some("40\\400"));
        assert_eq!(metadata.rescale_slope.as_deref(), Some("1"));
    }
}
