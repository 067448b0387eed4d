//! Reconciles board and FPGA flags, and the project file, into one [`FpgaSpec`].
//!
//! Exactly one [`Rule`] applies to a given set of flags. The rules are
//! checked in declaration order, so a board always wins over an FPGA id,
//! which wins over an explicit size/type/pack triple.

use std::fmt;

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, FpgaSpec};
use crate::err::Error;
use crate::project::{Project, PROJECT_FILE};

/// A user-suppliable flag that can clash with a board or FPGA definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Fpga,
    Size,
    Type,
    Pack,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fpga => "fpga",
            Self::Size => "size",
            Self::Type => "type",
            Self::Pack => "pack",
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct FpgaArgs {
    pub board: Option<String>,
    pub fpga: Option<String>,
    pub size: Option<String>,
    pub kind: Option<String>,
    pub pack: Option<String>,
}

fn given(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

impl FpgaArgs {
    fn board(&self) -> Option<&str> {
        given(self.board.as_ref())
    }

    fn fpga(&self) -> Option<&str> {
        given(self.fpga.as_ref())
    }

    fn triple(&self) -> [(Field, Option<&str>); 3] {
        [
            (Field::Size, given(self.size.as_ref())),
            (Field::Type, given(self.kind.as_ref())),
            (Field::Pack, given(self.pack.as_ref())),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    BoardGiven,
    FpgaGiven,
    TripleGiven,
    ProjectFallback,
    PartialTriple,
}

impl Rule {
    #[must_use]
    pub fn select(args: &FpgaArgs) -> Self {
        let triple_count = args.triple().iter().filter(|(_, v)| v.is_some()).count();
        if args.board().is_some() {
            Self::BoardGiven
        } else if args.fpga().is_some() {
            Self::FpgaGiven
        } else if triple_count == 3 {
            Self::TripleGiven
        } else if triple_count == 0 {
            Self::ProjectFallback
        } else {
            Self::PartialTriple
        }
    }

    #[must_use]
    pub fn reads_project(self) -> bool {
        self == Self::ProjectFallback
    }

    /// Logs that a project file is present but takes no part in resolution.
    pub fn note_ignored_project(self) {
        match self {
            Self::BoardGiven | Self::FpgaGiven | Self::TripleGiven => {
                info!("ignore {PROJECT_FILE} board");
            }
            Self::PartialTriple => info!("ignore {PROJECT_FILE} file"),
            Self::ProjectFallback => {}
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub spec: FpgaSpec,
    pub board: Option<String>,
    /// Flags that repeated what the board or FPGA already implied.
    pub redundant: Vec<Field>,
}

impl Resolution {
    #[must_use]
    pub fn variables(&self) -> Vec<String> {
        self.spec.variables()
    }
}

pub struct Resolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// `project` is the project file found in the working directory, if any.
    /// It is only consulted under [`Rule::ProjectFallback`].
    ///
    /// # Errors
    ///
    /// Will return `Err` if the flags name unknown parts, contradict each
    /// other, or do not identify an FPGA at all.
    pub fn resolve(&self, args: &FpgaArgs, project: Option<&Project>) -> Result<Resolution, Error> {
        let rule = Rule::select(args);
        debug!(?rule, "resolving fpga");

        match rule {
            Rule::BoardGiven => {
                let board = args.board().unwrap_or_default();
                let (fpga, spec) = self.board_spec(board)?;
                let redundant = self.reconcile(args, Some(fpga), spec)?;
                Ok(Resolution {
                    spec: spec.clone(),
                    board: Some(board.to_string()),
                    redundant,
                })
            }
            Rule::FpgaGiven => {
                let fpga = args.fpga().unwrap_or_default();
                let spec = self
                    .catalog
                    .fpga(fpga)
                    .ok_or_else(|| Error::UnknownFpga(fpga.to_string()))?;
                let redundant = self.reconcile(args, None, spec)?;
                Ok(Resolution {
                    spec: spec.clone(),
                    board: None,
                    redundant,
                })
            }
            Rule::TripleGiven => {
                let [(_, size), (_, kind), (_, pack)] = args.triple();
                Ok(Resolution {
                    spec: FpgaSpec::new(
                        size.unwrap_or_default(),
                        kind.unwrap_or_default(),
                        pack.unwrap_or_default(),
                    ),
                    board: None,
                    redundant: vec![],
                })
            }
            Rule::ProjectFallback => {
                let Some(board) = project.and_then(|p| p.board.as_deref()) else {
                    return Err(Error::MissingBoard);
                };
                info!("use {PROJECT_FILE} board: {board}");
                let (_, spec) = self.board_spec(board)?;
                Ok(Resolution {
                    spec: spec.clone(),
                    board: Some(board.to_string()),
                    redundant: vec![],
                })
            }
            Rule::PartialTriple => Err(Error::MissingFpgaFields(
                args.triple()
                    .into_iter()
                    .filter(|(_, v)| v.is_none())
                    .map(|(field, _)| field)
                    .collect(),
            )),
        }
    }

    fn board_spec(&self, board: &str) -> Result<(&'a str, &'a FpgaSpec), Error> {
        let fpga = &self
            .catalog
            .board(board)
            .ok_or_else(|| Error::UnknownBoard(board.to_string()))?
            .fpga;
        let spec = self
            .catalog
            .fpga(fpga)
            .ok_or_else(|| Error::UnknownFpga(fpga.clone()))?;
        Ok((fpga.as_str(), spec))
    }

    /// Compares explicit flags against the values implied by `fpga`/`spec`.
    /// `fpga` is `None` when the FPGA flag itself produced `spec`.
    fn reconcile(
        &self,
        args: &FpgaArgs,
        fpga: Option<&str>,
        spec: &FpgaSpec,
    ) -> Result<Vec<Field>, Error> {
        let mut redundant = vec![];
        let mut contradictory = vec![];
        let mut compare = |field: Field, user: &str, implied: &str| {
            if user == implied {
                redundant.push(field);
            } else {
                contradictory.push(field);
            }
        };

        if let (Some(implied), Some(user)) = (fpga, args.fpga()) {
            if self.catalog.fpga(user).is_none() {
                return Err(Error::UnknownFpga(user.to_string()));
            }
            compare(Field::Fpga, user, implied);
        }
        let implied = [spec.size.as_str(), spec.kind.as_str(), spec.pack.as_str()];
        for ((field, user), implied) in args.triple().into_iter().zip(implied) {
            if let Some(user) = user {
                compare(field, user, implied);
            }
        }

        if !redundant.is_empty() {
            let names: Vec<_> = redundant.iter().map(ToString::to_string).collect();
            warn!("redundant arguments: {}", names.join(", "));
        }
        if contradictory.is_empty() {
            Ok(redundant)
        } else {
            Err(Error::ContradictoryArguments(contradictory))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json(
            r#"{
                "alpha": {"fpga": "HX1K", "ftdi-desc": "FT2232H"},
                "beta": {"fpga": "UP5K", "ftdi-desc": "Dual RS232"},
                "orphan": {"fpga": "MISSING", "ftdi-desc": "x"}
            }"#,
            r#"{
                "HX1K": {"size": "1k", "type": "hx", "pack": "tq144"},
                "UP5K": {"size": "5k", "type": "up", "pack": "sg48"}
            }"#,
        )
        .unwrap()
    }

    fn args(board: Option<&str>, fpga: Option<&str>, triple: [Option<&str>; 3]) -> FpgaArgs {
        let own = |v: Option<&str>| v.map(String::from);
        FpgaArgs {
            board: own(board),
            fpga: own(fpga),
            size: own(triple[0]),
            kind: own(triple[1]),
            pack: own(triple[2]),
        }
    }

    #[test]
    fn rule_precedence() {
        let all = [Some("1k"), Some("hx"), Some("tq144")];
        assert_eq!(Rule::select(&args(Some("a"), Some("f"), all)), Rule::BoardGiven);
        assert_eq!(Rule::select(&args(None, Some("f"), all)), Rule::FpgaGiven);
        assert_eq!(Rule::select(&args(None, None, all)), Rule::TripleGiven);
        assert_eq!(
            Rule::select(&args(None, None, [None; 3])),
            Rule::ProjectFallback
        );
        assert_eq!(
            Rule::select(&args(None, None, [Some("1k"), None, None])),
            Rule::PartialTriple
        );
        // Empty strings count as absent
        assert_eq!(
            Rule::select(&args(Some(""), Some(""), [None; 3])),
            Rule::ProjectFallback
        );
    }

    #[test]
    fn every_bundled_board_resolves_to_its_fpga() {
        let catalog = Catalog::bundled().unwrap();
        let resolver = Resolver::new(&catalog);
        for (id, board) in catalog.boards() {
            let res = resolver
                .resolve(&args(Some(id), None, [None; 3]), None)
                .unwrap();
            assert_eq!(&res.spec, catalog.fpga(&board.fpga).unwrap());
            assert_eq!(res.board.as_deref(), Some(id));
            assert!(res.redundant.is_empty());
        }
    }

    #[test]
    fn board_variables_in_order() {
        let catalog = catalog();
        let res = Resolver::new(&catalog)
            .resolve(&args(Some("alpha"), None, [None; 3]), None)
            .unwrap();
        assert_eq!(
            res.variables(),
            ["fpga_size=1k", "fpga_type=hx", "fpga_pack=tq144"]
        );
    }

    #[test]
    fn redundant_flags_are_not_errors() {
        let catalog = catalog();
        let res = Resolver::new(&catalog)
            .resolve(
                &args(Some("alpha"), Some("HX1K"), [Some("1k"), None, Some("tq144")]),
                None,
            )
            .unwrap();
        assert_eq!(res.redundant, [Field::Fpga, Field::Size, Field::Pack]);
        assert_eq!(res.board.as_deref(), Some("alpha"));
    }

    #[test]
    fn contradictions_list_every_field() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog);
        let err = resolver
            .resolve(
                &args(Some("alpha"), Some("UP5K"), [Some("1k"), Some("up"), Some("sg48")]),
                None,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ContradictoryArguments(ref f) if f == &[Field::Fpga, Field::Type, Field::Pack]
        ));

        let err = resolver
            .resolve(&args(None, Some("UP5K"), [Some("1k"), None, None]), None)
            .unwrap_err();
        assert!(matches!(err, Error::ContradictoryArguments(ref f) if f == &[Field::Size]));
    }

    #[test]
    fn unknown_board_wins_over_everything() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog);
        for fpga in [None, Some("HX1K"), Some("bogus")] {
            let err = resolver
                .resolve(&args(Some("nope"), fpga, [Some("9k"), None, None]), None)
                .unwrap_err();
            assert!(matches!(err, Error::UnknownBoard(ref b) if b == "nope"));
        }
    }

    #[test]
    fn unknown_fpga() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog);
        let err = resolver
            .resolve(&args(Some("alpha"), Some("bogus"), [None; 3]), None)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFpga(ref f) if f == "bogus"));
        let err = resolver
            .resolve(&args(None, Some("bogus"), [None; 3]), None)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFpga(ref f) if f == "bogus"));
        let err = resolver
            .resolve(&args(Some("orphan"), None, [None; 3]), None)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFpga(ref f) if f == "MISSING"));
    }

    #[test]
    fn fpga_only_has_no_board() {
        let catalog = catalog();
        let res = Resolver::new(&catalog)
            .resolve(&args(None, Some("UP5K"), [None, Some("up"), None]), None)
            .unwrap();
        assert_eq!(res.spec, FpgaSpec::new("5k", "up", "sg48"));
        assert_eq!(res.board, None);
        assert_eq!(res.redundant, [Field::Type]);
    }

    #[test]
    fn triple_used_verbatim() {
        let catalog = catalog();
        let project = Project {
            board: Some("alpha".into()),
        };
        let res = Resolver::new(&catalog)
            .resolve(
                &args(None, None, [Some("8k"), Some("lp"), Some("cm81")]),
                Some(&project),
            )
            .unwrap();
        assert_eq!(res.spec, FpgaSpec::new("8k", "lp", "cm81"));
        assert_eq!(res.board, None);
    }

    #[test]
    fn two_of_three_names_the_missing_one() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog);
        let cases = [
            ([None, Some("hx"), Some("tq144")], Field::Size),
            ([Some("1k"), None, Some("tq144")], Field::Type),
            ([Some("1k"), Some("hx"), None], Field::Pack),
        ];
        for (triple, missing) in cases {
            let err = resolver.resolve(&args(None, None, triple), None).unwrap_err();
            assert!(matches!(err, Error::MissingFpgaFields(ref f) if f == &[missing]));
        }
        let err = resolver
            .resolve(&args(None, None, [None, None, Some("tq144")]), None)
            .unwrap_err();
        assert!(
            matches!(err, Error::MissingFpgaFields(ref f) if f == &[Field::Size, Field::Type])
        );
    }

    #[test]
    fn project_fallback() {
        let catalog = catalog();
        let resolver = Resolver::new(&catalog);
        let none = args(None, None, [None; 3]);

        let project = Project {
            board: Some("beta".into()),
        };
        let res = resolver.resolve(&none, Some(&project)).unwrap();
        assert_eq!(res.board.as_deref(), Some("beta"));
        assert_eq!(res.spec, FpgaSpec::new("5k", "up", "sg48"));

        assert!(matches!(
            resolver.resolve(&none, None),
            Err(Error::MissingBoard)
        ));
        assert!(matches!(
            resolver.resolve(&none, Some(&Project::default())),
            Err(Error::MissingBoard)
        ));
        let project = Project {
            board: Some("gone".into()),
        };
        assert!(matches!(
            resolver.resolve(&none, Some(&project)),
            Err(Error::UnknownBoard(_))
        ));
    }
}
