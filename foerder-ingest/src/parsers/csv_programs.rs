//! Program collections exported as CSV.
//!
//! Expected header (any column order, missing columns allowed):
//!   id,title,provider,description,focus,requirements,budget,deadline,region,
//!   funding_type,target_groups,url,contact

use std::io::Read;

use anyhow::Result;
use foerder_core::FundingProgram;

use crate::types::ProgramRow;

fn split_list(raw: &str, separators: &[char]) -> Vec<String> {
    raw.split(|c: char| separators.contains(&c))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl ProgramRow {
    /// `None` when the row lacks an id or any region.
    pub fn into_program(self) -> Option<FundingProgram> {
        let id = self.id.trim().to_string();
        let region = split_list(&self.region, &[';', ',', '|']);
        if id.is_empty() || region.is_empty() {
            return None;
        }

        Some(FundingProgram {
            id,
            title: self.title,
            provider: self.provider,
            description: self.description,
            focus: self.focus,
            requirements: self.requirements,
            budget: self.budget,
            deadline: self.deadline,
            region,
            funding_type: self.funding_type,
            target_groups: split_list(&self.target_groups, &[';']),
            url: self.url,
            contact: self.contact,
        })
    }
}

/// Parse CSV program rows, skipping rows without an id or region.
pub fn parse_programs_csv<R: Read>(reader: R) -> Result<Vec<FundingProgram>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut out = Vec::new();
    for (i, result) in rdr.deserialize::<ProgramRow>().enumerate() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(row = i + 1, error = %e, "skipping malformed program row");
                continue;
            }
        };

        match row.into_program() {
            Some(p) => out.push(p),
            None => tracing::warn!(row = i + 1, "skipping program row without id or region"),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programs_csv_basic() {
        let text = "\
id,title,provider,budget,deadline,region,target_groups
p1,Schulgarten,Umweltstiftung,\"50.000 €\",31.03.2026,BY;BW,Grundschule; Förderschule
p2,Digitalpakt,BMBF,\"1,5 Mio €\",laufend,bundesweit,
";
        let programs = parse_programs_csv(text.as_bytes()).unwrap();
        assert_eq!(programs.len(), 2);
        assert_eq!(programs[0].region, vec!["BY", "BW"]);
        assert_eq!(programs[0].target_groups, vec!["Grundschule", "Förderschule"]);
        assert_eq!(programs[1].budget, "1,5 Mio €");
        assert!(programs[1].is_nationwide());
        assert!(programs[1].description.is_empty());
    }

    #[test]
    fn test_rows_without_id_or_region_skipped() {
        let text = "\
id,title,region
,Ohne Id,BY
p2,Ohne Region,
p3,Gültig,NW|NI
";
        let programs = parse_programs_csv(text.as_bytes()).unwrap();
        assert_eq!(programs.len(), 1);
        assert_eq!(programs[0].id, "p3");
        assert_eq!(programs[0].region, vec!["NW", "NI"]);
    }
}
