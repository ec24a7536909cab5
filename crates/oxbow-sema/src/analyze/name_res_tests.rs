use crate::Session;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ir::{NodeId, NodeKind, PermKind};

use super::resolve_module;

fn dcl_of(sess: &Session, name_use: NodeId) -> Option<NodeId> {
    match sess.arena.kind(name_use) {
        NodeKind::NameUse { dcl, .. } => *dcl,
        _ => panic!("not a name use"),
    }
}

/// fn caller() void { callee() }   fn callee() void {}
#[test]
fn forward_reference_at_module_scope() {
    let mut sess = Session::new();
    let void = sess.arena.void();

    let mut b = sess.builder();
    let caller = b.name("caller");
    let callee = b.name("callee");

    let use_callee = b.name_use(callee);
    let call = b.fn_call(use_callee, vec![]);
    let caller_body = b.block(vec![call]);
    let caller_sig = b.fn_sig(vec![], void);
    let caller_dcl = b.fn_dcl(caller, caller_sig, Some(caller_body));

    let callee_sig = b.fn_sig(vec![], void);
    let callee_body = b.block(vec![]);
    let callee_dcl = b.fn_dcl(callee, callee_sig, Some(callee_body));

    // callee is declared after its use site.
    let module = b.module(vec![caller_dcl, callee_dcl]);

    resolve_module(&mut sess.arena, &sess.interner, &mut sess.diag, module);
    assert!(!sess.diag.has_errors());
    assert_eq!(dcl_of(&sess, use_callee), Some(callee_dcl));
}

#[test]
fn unknown_name_is_recoverable() {
    let mut sess = Session::new();
    let void = sess.arena.void();

    let mut b = sess.builder();
    let f = b.name("f");
    let use_missing = b.use_of("missing");
    let body = b.block(vec![use_missing]);
    let sig = b.fn_sig(vec![], void);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);

    resolve_module(&mut sess.arena, &sess.interner, &mut sess.diag, module);
    assert_eq!(sess.diag.error_count(), 1);
    assert_eq!(dcl_of(&sess, use_missing), None);
}

#[test]
fn use_before_declaration_in_body_is_an_error() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();
    let void = sess.arena.void();

    let mut b = sess.builder();
    let f = b.name("f");
    let x = b.name("x");
    let use_x = b.name_use(x);
    let one = b.ulit(1, builtins.i32);
    let x_dcl = b.var_dcl(x, PermKind::Imm, builtins.i32, Some(one));
    // Use site lexically precedes the declaration.
    let body = b.block(vec![use_x, x_dcl]);
    let sig = b.fn_sig(vec![], void);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);

    resolve_module(&mut sess.arena, &sess.interner, &mut sess.diag, module);
    assert!(sess.diag.has_errors());
    assert_eq!(dcl_of(&sess, use_x), None);
}

#[test]
fn duplicate_variable_in_same_scope() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();
    let void = sess.arena.void();

    let mut b = sess.builder();
    let f = b.name("f");
    let x = b.name("x");
    let one = b.ulit(1, builtins.i32);
    let two = b.ulit(2, builtins.i32);
    let first = b.var_dcl(x, PermKind::Imm, builtins.i32, Some(one));
    let second = b.var_dcl(x, PermKind::Imm, builtins.i32, Some(two));
    let body = b.block(vec![first, second]);
    let sig = b.fn_sig(vec![], void);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);

    resolve_module(&mut sess.arena, &sess.interner, &mut sess.diag, module);
    let kinds: Vec<_> = sess.diag.iter().map(|d| d.kind()).collect();
    assert_eq!(kinds, vec![DiagnosticKind::DuplicateName]);
}

#[test]
fn shadowing_in_nested_block_is_allowed() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();
    let void = sess.arena.void();

    let mut b = sess.builder();
    let f = b.name("f");
    let x = b.name("x");
    let one = b.ulit(1, builtins.i32);
    let outer = b.var_dcl(x, PermKind::Imm, builtins.i32, Some(one));
    let two = b.ulit(2, builtins.i32);
    let inner = b.var_dcl(x, PermKind::Imm, builtins.i32, Some(two));
    let inner_use = b.name_use(x);
    let nested = b.block(vec![inner, inner_use]);
    let outer_use = b.name_use(x);
    let body = b.block(vec![outer, nested, outer_use]);
    let sig = b.fn_sig(vec![], void);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);

    resolve_module(&mut sess.arena, &sess.interner, &mut sess.diag, module);
    assert!(!sess.diag.has_errors());
    assert_eq!(dcl_of(&sess, inner_use), Some(inner));
    assert_eq!(dcl_of(&sess, outer_use), Some(outer));
}

#[test]
fn function_and_struct_may_not_share_a_name() {
    let mut sess = Session::new();
    let void = sess.arena.void();

    let mut b = sess.builder();
    let name = b.name("thing");
    let sig = b.fn_sig(vec![], void);
    let f_dcl = b.fn_dcl(name, sig, None);
    let s_dcl = b.struct_dcl(name, vec![], vec![], 0, vec![]);
    let module = b.module(vec![f_dcl, s_dcl]);

    resolve_module(&mut sess.arena, &sess.interner, &mut sess.diag, module);
    let kinds: Vec<_> = sess.diag.iter().map(|d| d.kind()).collect();
    assert_eq!(kinds, vec![DiagnosticKind::DuplicateName]);
}

#[test]
fn methods_overload_but_fields_do_not() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();
    let void = sess.arena.void();

    let mut b = sess.builder();
    let point = b.name("Point");
    let area = b.name("area");
    let x = b.name("x");

    let zero = b.ulit(0, builtins.i32);
    let x_field = b.field_dcl(x, builtins.i32, Some(zero));

    let sig1 = b.fn_sig(vec![], builtins.i32);
    let m1 = b.method_dcl(area, sig1, None);
    let sig2 = b.fn_sig(vec![], builtins.f32);
    let m2 = b.method_dcl(area, sig2, None);
    // A method colliding with a field is rejected.
    let sig3 = b.fn_sig(vec![], void);
    let m3 = b.method_dcl(x, sig3, None);

    let s = b.struct_dcl(point, vec![x_field], vec![m1, m2, m3], 0, vec![]);
    let module = b.module(vec![s]);

    resolve_module(&mut sess.arena, &sess.interner, &mut sess.diag, module);
    let kinds: Vec<_> = sess.diag.iter().map(|d| d.kind()).collect();
    assert_eq!(kinds, vec![DiagnosticKind::DuplicateName]);

    match sess.arena.kind(s) {
        NodeKind::Struct { namespace, .. } => {
            assert_eq!(namespace.get(area), Some(&[m1, m2][..]));
            assert_eq!(namespace.get(x), Some(&[x_field][..]));
        }
        _ => unreachable!(),
    }
}

#[test]
fn struct_fields_visible_in_method_bodies() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let point = b.name("Point");
    let x = b.name("x");
    let get_x = b.name("get_x");

    let x_field = b.field_dcl(x, builtins.i32, None);
    let use_x = b.name_use(x);
    let ret = b.return_node(Some(use_x));
    let body = b.block(vec![ret]);
    let sig = b.fn_sig(vec![], builtins.i32);
    let method = b.method_dcl(get_x, sig, Some(body));

    let s = b.struct_dcl(point, vec![x_field], vec![method], 0, vec![]);
    let module = b.module(vec![s]);

    resolve_module(&mut sess.arena, &sess.interner, &mut sess.diag, module);
    assert!(!sess.diag.has_errors());
    assert_eq!(dcl_of(&sess, use_x), Some(x_field));
}

/// A resolution error stops the pipeline before type check, so the
/// unresolved use produces no spurious type errors on top.
#[test]
fn pipeline_halts_after_resolution_errors() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let f = b.name("f");
    let missing = b.use_of("missing");
    let ret = b.return_node(Some(missing));
    let body = b.block(vec![ret]);
    let sig = b.fn_sig(vec![], builtins.i32);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);

    assert!(sess.analyze(module).is_err());
    assert_eq!(sess.diag.error_count(), 1);
}

/// Resolving an already-resolved tree again yields identical bindings and
/// no new errors.
#[test]
fn resolution_is_idempotent() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let f = b.name("f");
    let g = b.name("g");
    let x = b.name("x");

    let parm = b.parm(x, builtins.i32);
    let sig_f = b.fn_sig(vec![parm], builtins.i32);
    let use_x = b.name_use(x);
    let use_g = b.name_use(g);
    let call_g = b.fn_call(use_g, vec![use_x]);
    let ret = b.return_node(Some(call_g));
    let body = b.block(vec![ret]);
    let f_dcl = b.fn_dcl(f, sig_f, Some(body));

    let parm_g = b.parm(x, builtins.i32);
    let sig_g = b.fn_sig(vec![parm_g], builtins.i32);
    let g_dcl = b.fn_dcl(g, sig_g, None);

    let module = b.module(vec![f_dcl, g_dcl]);

    resolve_module(&mut sess.arena, &sess.interner, &mut sess.diag, module);
    assert!(!sess.diag.has_errors());
    let bindings_before: Vec<_> = sess
        .arena
        .ids()
        .filter_map(|id| match sess.arena.kind(id) {
            NodeKind::NameUse { dcl, .. } => Some((id, *dcl)),
            _ => None,
        })
        .collect();

    let mut fresh_diag = Diagnostics::new();
    resolve_module(&mut sess.arena, &sess.interner, &mut fresh_diag, module);
    assert!(!fresh_diag.has_errors());

    let bindings_after: Vec<_> = sess
        .arena
        .ids()
        .filter_map(|id| match sess.arena.kind(id) {
            NodeKind::NameUse { dcl, .. } => Some((id, *dcl)),
            _ => None,
        })
        .collect();
    assert_eq!(bindings_before, bindings_after);
}
