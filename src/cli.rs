// src/cli.rs
use std::{error::Error, path::PathBuf};

use crate::aggregate::GradeMode;
use crate::page::{HtmlPage, PageAdapter};
use crate::session::{GradeSession, RowId};

pub struct Params {
    pub page: Option<PathBuf>,
    pub mode: Option<GradeMode>,
    /// (name, category, earned, total)
    pub adds: Vec<(String, String, f64, f64)>,
    /// (row, earned text, optional explicit total)
    pub edits: Vec<(RowId, String, Option<f64>)>,
    /// (row, percent, optional explicit total)
    pub percents: Vec<(RowId, f64, Option<f64>)>,
    /// (row, letter, optional explicit total)
    pub letters: Vec<(RowId, String, Option<f64>)>,
    pub removes: Vec<RowId>,
    pub undo: u32,
    pub redo: u32,
    pub reset: bool,
    pub list: bool,
    pub json: bool,
}

impl Params {
    pub fn new() -> Self {
        Self {
            page: None,
            mode: None,
            adds: Vec::new(),
            edits: Vec::new(),
            percents: Vec::new(),
            letters: Vec::new(),
            removes: Vec::new(),
            undo: 0,
            redo: 0,
            reset: false,
            list: false,
            json: false,
        }
    }
}

impl Default for Params {
    fn default() -> Self { Self::new() }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let mut params = Params::new();
    parse_args(&mut params, std::env::args().skip(1))?;

    let path = params.page.clone().ok_or("Missing --page <file>")?;
    let page = HtmlPage::load(&path)?;

    let has_weights = !page.category_weights().is_empty();
    let mode = params.mode.unwrap_or(if has_weights {
        GradeMode::Weighted
    } else {
        GradeMode::Unweighted
    });
    if mode == GradeMode::Weighted && !has_weights {
        return Err("page declares no category weights; use --unweighted".into());
    }

    let mut session = GradeSession::new(Box::new(page));
    apply(&mut session, &params)?;

    let report = session.report(mode);
    if params.list {
        for r in &report.rows {
            println!("{}\t{}\t{}\t{}", r.row, r.category, r.display, r.name);
        }
        return Ok(());
    }
    if params.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

/// Apply the requested what-if actions in a fixed order: adds, edits,
/// percent/letter edits, removals, then undo/redo.
fn apply(session: &mut GradeSession, params: &Params) -> Result<(), Box<dyn Error>> {
    for (name, category, earned, total) in &params.adds {
        session.add_hypothetical(name, category, *earned, *total)?;
    }
    for (row, input, total) in &params.edits {
        match total {
            Some(t) => session.edit_score_with_total(*row, input, *t)?,
            None => session.edit_score(*row, input)?,
        };
    }
    for (row, pct, total) in &params.percents {
        match total {
            Some(t) => session.edit_percent_with_total(*row, *pct, *t)?,
            None => session.edit_percent(*row, *pct)?,
        };
    }
    for (row, letter, total) in &params.letters {
        match total {
            Some(t) => session.edit_letter_with_total(*row, letter, *t)?,
            None => session.edit_letter(*row, letter)?,
        };
    }
    for row in &params.removes {
        session.remove_hypothetical(*row)?;
    }
    for _ in 0..params.undo {
        if session.undo().is_none() {
            eprintln!("Nothing to undo");
            break;
        }
    }
    for _ in 0..params.redo {
        if session.redo().is_none() {
            eprintln!("Nothing to redo");
            break;
        }
    }
    if params.reset {
        let key = session.current_class().clone();
        session.reset_class(&key);
    }
    Ok(())
}

pub fn parse_args(
    params: &mut Params,
    mut args: impl Iterator<Item = String>,
) -> Result<(), Box<dyn Error>> {
    while let Some(a) = args.next() {
        match a.as_str()
        {
            "-p" | "--page" => {
                let v = args.next().ok_or("Missing value for --page")?;
                params.page = Some(PathBuf::from(v));}
            "--weighted" => params.mode = Some(GradeMode::Weighted),
            "--unweighted" => params.mode = Some(GradeMode::Unweighted),
            "-a" | "--add" => {
                let v = args.next().ok_or("Missing value for --add")?;
                params.adds.push(parse_add(&v)?);}
            "-e" | "--edit" => {
                let v = args.next().ok_or("Missing value for --edit")?;
                params.edits.push(parse_edit(&v)?);}
            "--percent" => {
                let v = args.next().ok_or("Missing value for --percent")?;
                let (row, val) = split_assignment(&v)?;
                let (pct, total) = split_total(&val)?;
                params.percents.push((row, pct.parse()?, total));}
            "--letter" => {
                let v = args.next().ok_or("Missing value for --letter")?;
                let (row, val) = split_assignment(&v)?;
                let (letter, total) = split_total(&val)?;
                params.letters.push((row, letter, total));}
            "--remove" => {
                let v = args.next().ok_or("Missing value for --remove")?;
                params.removes.push(parse_row_ref(&v, true)?);}
            "--undo" => {
                let v = args.next().ok_or("Missing count for --undo")?;
                params.undo = v.parse()?;}
            "--redo" => {
                let v = args.next().ok_or("Missing count for --redo")?;
                params.redo = v.parse()?;}
            "--reset" => params.reset = true,
            "-l" | "--list" => params.list = true,
            "--json" => params.json = true,
            "-h" | "--help" => {
                eprintln!(include_str!("cli_help.txt"));
                std::process::exit(0);
            }
            _ => return Err(format!("Unknown arg: {}", a).into()),
        }
    }

    Ok(())
}

/// `name:category:earned/total`, e.g. "Retake:Tests:45/50".
/// An extra-credit add uses a zero total: "Bonus:Tests:5/0".
fn parse_add(s: &str) -> Result<(String, String, f64, f64), Box<dyn Error>> {
    let (left, frac) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("Invalid --add (want name:category:earned/total): {s}"))?;
    let (name, category) = left
        .rsplit_once(':')
        .ok_or_else(|| format!("Invalid --add (want name:category:earned/total): {s}"))?;
    let (e, t) = frac
        .split_once('/')
        .ok_or_else(|| format!("Invalid score in --add (want earned/total): {frac}"))?;
    Ok((
        name.trim().to_string(),
        category.trim().to_string(),
        e.trim().parse()?,
        t.trim().parse()?,
    ))
}

/// `row=earned` or `row=earned/total` (the latter for rows with no
/// discoverable denominator, e.g. NG cells).
fn parse_edit(s: &str) -> Result<(RowId, String, Option<f64>), Box<dyn Error>> {
    let (row, val) = split_assignment(s)?;
    match val.split_once('/') {
        Some((e, t)) => Ok((row, e.trim().to_string(), Some(t.trim().parse()?))),
        None => Ok((row, val.to_string(), None)),
    }
}

/// `value` or `value/total`; the total form supplies a missing denominator
/// for percent and letter edits, same as `--edit`'s earned/total form.
fn split_total(s: &str) -> Result<(String, Option<f64>), Box<dyn Error>> {
    match s.split_once('/') {
        Some((v, t)) => Ok((v.trim().to_string(), Some(t.trim().parse()?))),
        None => Ok((s.to_string(), None)),
    }
}

fn split_assignment(s: &str) -> Result<(RowId, String), Box<dyn Error>> {
    let (row, val) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid assignment (want row=value): {s}"))?;
    Ok((parse_row_ref(row, false)?, val.trim().to_string()))
}

/// Accepts a full row id ("original-row-3", "hypothetical-row-0") or a bare
/// index, which refers to an original row for edits and a hypothetical for
/// removals.
fn parse_row_ref(s: &str, hypothetical: bool) -> Result<RowId, Box<dyn Error>> {
    let s = s.trim();
    if let Some(id) = RowId::parse(s) {
        return Ok(id);
    }
    let n: u32 = s
        .parse()
        .map_err(|_| format!("Invalid row reference: {s}"))?;
    Ok(if hypothetical { RowId::Hypothetical(n) } else { RowId::Original(n) })
}
