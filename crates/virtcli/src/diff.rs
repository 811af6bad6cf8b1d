//! Line-based unified diff used by `--print-diff`.

const CONTEXT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Equal,
    Replace,
    Delete,
    Insert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Op {
    tag: Tag,
    a: (usize, usize),
    b: (usize, usize),
}

/// Unified diff from `old` to `new` with three lines of context; empty
/// when the texts are equal.
pub fn unified(old: &str, new: &str, from: &str, to: &str) -> String {
    if old == new {
        return String::new();
    }
    let a: Vec<&str> = old.split_inclusive('\n').collect();
    let b: Vec<&str> = new.split_inclusive('\n').collect();

    let mut out = format!("--- {from}\n+++ {to}\n");
    for group in grouped(opcodes(&a, &b)) {
        let (first, last) = (group[0], group[group.len() - 1]);
        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            range(first.a.0, last.a.1),
            range(first.b.0, last.b.1)
        ));
        for op in group {
            if op.tag == Tag::Equal {
                push_lines(&mut out, ' ', &a[op.a.0..op.a.1]);
                continue;
            }
            if matches!(op.tag, Tag::Replace | Tag::Delete) {
                push_lines(&mut out, '-', &a[op.a.0..op.a.1]);
            }
            if matches!(op.tag, Tag::Replace | Tag::Insert) {
                push_lines(&mut out, '+', &b[op.b.0..op.b.1]);
            }
        }
    }
    out
}

fn push_lines(out: &mut String, prefix: char, lines: &[&str]) {
    for line in lines {
        out.push(prefix);
        out.push_str(line);
        if !line.ends_with('\n') {
            out.push('\n');
        }
    }
}

fn range(start: usize, stop: usize) -> String {
    let length = stop - start;
    match length {
        1 => format!("{}", start + 1),
        0 => format!("{start},0"),
        _ => format!("{},{length}", start + 1),
    }
}

/// Edit script from `a` to `b`. Shared leading and trailing lines are
/// matched directly; only the differing middle goes through the LCS table.
fn opcodes(a: &[&str], b: &[&str]) -> Vec<Op> {
    let (n, m) = (a.len(), b.len());
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mut ops = Vec::new();
    if prefix > 0 {
        ops.push(Op {
            tag: Tag::Equal,
            a: (0, prefix),
            b: (0, prefix),
        });
    }
    let middle = lcs_opcodes(&a[prefix..n - suffix], &b[prefix..m - suffix]);
    ops.extend(middle.into_iter().map(|op| Op {
        a: (op.a.0 + prefix, op.a.1 + prefix),
        b: (op.b.0 + prefix, op.b.1 + prefix),
        ..op
    }));
    if suffix > 0 {
        ops.push(Op {
            tag: Tag::Equal,
            a: (n - suffix, n),
            b: (m - suffix, m),
        });
    }
    ops
}

/// Edit script over a longest common subsequence of lines.
fn lcs_opcodes(a: &[&str], b: &[&str]) -> Vec<Op> {
    let (n, m) = (a.len(), b.len());
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut ops: Vec<Op> = Vec::new();
    let (mut i, mut j) = (0, 0);
    let (mut del_from, mut ins_from) = (0, 0);
    let flush = |ops: &mut Vec<Op>, (i0, i1): (usize, usize), (j0, j1): (usize, usize)| {
        let tag = match (i1 > i0, j1 > j0) {
            (true, true) => Tag::Replace,
            (true, false) => Tag::Delete,
            (false, true) => Tag::Insert,
            (false, false) => return,
        };
        ops.push(Op {
            tag,
            a: (i0, i1),
            b: (j0, j1),
        });
    };
    while i < n || j < m {
        if i < n && j < m && a[i] == b[j] {
            flush(&mut ops, (del_from, i), (ins_from, j));
            match ops.last_mut() {
                Some(last) if last.tag == Tag::Equal && last.a.1 == i => {
                    last.a.1 += 1;
                    last.b.1 += 1;
                }
                _ => ops.push(Op {
                    tag: Tag::Equal,
                    a: (i, i + 1),
                    b: (j, j + 1),
                }),
            }
            i += 1;
            j += 1;
            del_from = i;
            ins_from = j;
        } else if j == m || (i < n && lcs[i + 1][j] >= lcs[i][j + 1]) {
            i += 1;
        } else {
            j += 1;
        }
    }
    flush(&mut ops, (del_from, n), (ins_from, m));
    ops
}

/// Hunks of changes, each padded with up to `CONTEXT` equal lines.
fn grouped(mut ops: Vec<Op>) -> Vec<Vec<Op>> {
    if ops.is_empty() {
        return Vec::new();
    }
    if let Some(first) = ops.first_mut().filter(|op| op.tag == Tag::Equal) {
        first.a.0 = first.a.0.max(first.a.1.saturating_sub(CONTEXT));
        first.b.0 = first.b.0.max(first.b.1.saturating_sub(CONTEXT));
    }
    if let Some(last) = ops.last_mut().filter(|op| op.tag == Tag::Equal) {
        last.a.1 = last.a.1.min(last.a.0 + CONTEXT);
        last.b.1 = last.b.1.min(last.b.0 + CONTEXT);
    }

    let mut groups = Vec::new();
    let mut group: Vec<Op> = Vec::new();
    for mut op in ops {
        if op.tag == Tag::Equal && op.a.1 - op.a.0 > 2 * CONTEXT {
            group.push(Op {
                tag: Tag::Equal,
                a: (op.a.0, op.a.0 + CONTEXT),
                b: (op.b.0, op.b.0 + CONTEXT),
            });
            groups.push(std::mem::take(&mut group));
            op.a.0 = op.a.1 - CONTEXT;
            op.b.0 = op.b.1 - CONTEXT;
        }
        group.push(op);
    }
    if !(group.is_empty() || (group.len() == 1 && group[0].tag == Tag::Equal)) {
        groups.push(group);
    }
    groups.retain(|group| group.iter().any(|op| op.tag != Tag::Equal));
    groups
}
