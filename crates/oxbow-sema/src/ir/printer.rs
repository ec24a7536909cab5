//! Structural IR serializer.
//!
//! Emits an indented, parenthesized form stable enough for golden-output
//! tests: `(cast, <type>, <exp>)`, `(is, <type>, <exp>)`, `if`/`elif`/`else`
//! branch lines, literal lists as `[e1,e2,…]`. Indentation writes a `| `
//! marker at every fourth level so deep trees stay readable. Output is a
//! pure function of the tree: printing twice yields identical text.

use oxbow_core::Interner;

use super::arena::{NodeArena, NodeId};
use super::node::NodeKind;

/// Serialize one node (and its subtree) to a string.
pub fn print_node(arena: &NodeArena, interner: &Interner, id: NodeId) -> String {
    let mut p = Printer {
        arena,
        interner,
        out: String::new(),
        indent: 0,
        at_line_start: true,
    };
    p.node(id);
    p.nl();
    p.out
}

struct Printer<'a> {
    arena: &'a NodeArena,
    interner: &'a Interner,
    out: String,
    indent: usize,
    at_line_start: bool,
}

impl Printer<'_> {
    fn w(&mut self, s: &str) {
        if self.at_line_start {
            for level in 0..self.indent {
                self.out
                    .push_str(if level & 3 == 0 { "| " } else { "  " });
            }
            self.at_line_start = false;
        }
        self.out.push_str(s);
    }

    fn nl(&mut self) {
        if !self.at_line_start {
            self.out.push('\n');
            self.at_line_start = true;
        }
    }

    fn sym(&mut self, sym: oxbow_core::Symbol) {
        let s = self
            .interner
            .try_resolve(sym)
            .unwrap_or("<unknown-name>")
            .to_owned();
        self.w(&s);
    }

    fn list(&mut self, items: &[NodeId]) {
        self.w("[");
        for (i, &item) in items.iter().enumerate() {
            if i > 0 {
                self.w(",");
            }
            self.node(item);
        }
        self.w("]");
    }

    fn node(&mut self, id: NodeId) {
        let void = self.arena.void();
        match self.arena.kind(id).clone() {
            NodeKind::ULit { val } => self.w(&val.to_string()),
            NodeKind::FLit { val } => self.w(&format!("{:?}", val)),
            NodeKind::NameUse { name, .. } => self.sym(name),
            NodeKind::NamedVal { name, val } => {
                self.sym(name);
                self.w(": ");
                self.node(val);
            }

            NodeKind::VTuple { values } => self.list(&values),
            NodeKind::Assign { lval, rval } => {
                self.w("(=, ");
                self.node(lval);
                self.w(", ");
                self.node(rval);
                self.w(")");
            }
            NodeKind::FnCall {
                callee,
                method,
                args,
            } => {
                self.w("(call, ");
                self.node(callee);
                if let Some(m) = method {
                    self.w(".");
                    self.sym(m);
                }
                self.w(", ");
                self.list(&args);
                self.w(")");
            }
            NodeKind::TypeLit { typ, args } => {
                self.node(typ);
                self.list(&args);
            }
            NodeKind::Cast { exp, typ } => {
                self.w("(cast, ");
                self.node(typ);
                self.w(", ");
                self.node(exp);
                self.w(")");
            }
            NodeKind::Is { exp, typ } => {
                self.w("(is, ");
                self.node(typ);
                self.w(", ");
                self.node(exp);
                self.w(")");
            }
            NodeKind::Deref { exp } => {
                self.w("*");
                self.node(exp);
            }
            NodeKind::LogicNot { exp } => {
                self.w("(!, ");
                self.node(exp);
                self.w(")");
            }
            NodeKind::LogicAnd { lhs, rhs } => {
                self.w("(&&, ");
                self.node(lhs);
                self.w(", ");
                self.node(rhs);
                self.w(")");
            }
            NodeKind::LogicOr { lhs, rhs } => {
                self.w("(||, ");
                self.node(lhs);
                self.w(", ");
                self.node(rhs);
                self.w(")");
            }

            NodeKind::Block { stmts } => {
                self.w("block");
                self.indent += 1;
                for stmt in stmts {
                    self.nl();
                    self.node(stmt);
                }
                self.indent -= 1;
                self.nl();
            }
            NodeKind::If { branches } => {
                for (i, (cond, block)) in branches.iter().enumerate() {
                    if i == 0 {
                        self.w("if ");
                        self.node(*cond);
                    } else if *cond == void {
                        self.w("else");
                    } else {
                        self.w("elif ");
                        self.node(*cond);
                    }
                    self.nl();
                    self.node(*block);
                }
            }
            NodeKind::Loop { body, .. } => {
                self.w("loop");
                self.nl();
                self.node(body);
            }
            NodeKind::Break { exp } => {
                self.w("break");
                if let Some(e) = exp {
                    self.w(" ");
                    self.node(e);
                }
            }
            NodeKind::Continue => self.w("continue"),
            NodeKind::Return { exp, .. } => {
                self.w("return");
                if let Some(e) = exp {
                    self.w(" ");
                    self.node(e);
                }
            }
            NodeKind::BlockRet { exp, .. } => {
                self.w("blockret");
                if let Some(e) = exp {
                    self.w(" ");
                    self.node(e);
                }
            }

            NodeKind::VarDcl {
                name,
                perm,
                typ,
                init,
            } => {
                self.sym(name);
                self.w(" ");
                self.w(perm.keyword());
                if typ != void {
                    self.w(" ");
                    self.node(typ);
                }
                if let Some(init) = init {
                    self.w(" = ");
                    self.node(init);
                }
            }
            NodeKind::FnDcl { name, sig, body } => {
                self.w("fn ");
                self.sym(name);
                self.w(" ");
                self.node(sig);
                if let Some(body) = body {
                    self.nl();
                    self.node(body);
                }
            }
            NodeKind::FieldDcl { name, typ, default } => {
                self.sym(name);
                self.w(" ");
                self.node(typ);
                if let Some(default) = default {
                    self.w(" = ");
                    self.node(default);
                }
            }
            NodeKind::Module { items, .. } => {
                self.w("module");
                self.indent += 1;
                for item in items {
                    self.nl();
                    self.node(item);
                }
                self.indent -= 1;
                self.nl();
            }

            NodeKind::IntNbr { bits } => self.w(&format!("i{}", bits)),
            NodeKind::UintNbr { bits } => {
                if id == self.arena.builtins().usize {
                    self.w("usize");
                } else {
                    self.w(&format!("u{}", bits));
                }
            }
            NodeKind::FloatNbr { bits } => self.w(&format!("f{}", bits)),
            NodeKind::Void => self.w("void"),
            NodeKind::Bool => self.w("bool"),
            NodeKind::Perm { kind } => self.w(kind.keyword()),
            NodeKind::Ref { pvtype, perm } => {
                self.w("&");
                self.w(perm.keyword());
                self.w(" ");
                self.node(pvtype);
            }
            NodeKind::Ptr { pvtype } => {
                self.w("*");
                self.node(pvtype);
            }
            NodeKind::ArrayRef { pvtype, perm } => {
                self.w("&[");
                self.w(perm.keyword());
                self.w(" ");
                self.node(pvtype);
                self.w("]");
            }
            NodeKind::VirtRef { pvtype, perm } => {
                self.w("&virt ");
                self.w(perm.keyword());
                self.w(" ");
                self.node(pvtype);
            }
            NodeKind::Array { elem, size } => {
                self.w(&format!("[{}]", size));
                self.node(elem);
            }
            NodeKind::Struct {
                name,
                fields,
                methods,
                ..
            } => {
                self.w("struct ");
                self.sym(name);
                self.indent += 1;
                for field in fields {
                    self.nl();
                    self.node(field);
                }
                for method in methods {
                    self.nl();
                    self.node(method);
                }
                self.indent -= 1;
                self.nl();
            }
            NodeKind::FnSig { parms, rettype } => {
                self.w("(");
                for (i, &parm) in parms.iter().enumerate() {
                    if i > 0 {
                        self.w(", ");
                    }
                    self.node(parm);
                }
                self.w(") ");
                self.node(rettype);
            }
            NodeKind::TTuple { types } => {
                self.w("(");
                for (i, &t) in types.iter().enumerate() {
                    if i > 0 {
                        self.w(", ");
                    }
                    self.node(t);
                }
                self.w(")");
            }
            NodeKind::Lifetime { name } => {
                self.w("'");
                self.sym(name);
            }
        }
    }
}
