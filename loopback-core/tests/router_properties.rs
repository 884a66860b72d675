use http::Method;
use loopback_core::{Pattern, Router};

const TEMPLATES: &[&str] = &[
    "/auth/login",
    "/hr/employees/:id",
    "/hr/leaves/:id/approve",
    "/projects/:project/tasks/:task",
    "/a/:one/b/:two/c/:three",
];

fn concrete(template: &str, values: &[&str]) -> String {
    let mut values = values.iter();
    template
        .split('/')
        .map(|seg| {
            if seg.starts_with(':') {
                values.next().copied().unwrap_or("x").to_string()
            } else {
                seg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[test]
fn k_captures_yield_k_params_in_order() {
    let values = ["11", "22", "33"];
    for template in TEMPLATES {
        let pattern = Pattern::compile(template).unwrap();
        let k = pattern.captures().count();
        let params = pattern
            .matches(&concrete(template, &values))
            .unwrap_or_else(|| panic!("{template} should match its own shape"));

        assert_eq!(params.len(), k, "{template}");
        let got: Vec<&str> = params.iter().map(|(_, v)| v).collect();
        assert_eq!(got, values[..k].to_vec(), "{template}");
        let names: Vec<&str> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, pattern.captures().collect::<Vec<_>>(), "{template}");
    }
}

#[test]
fn different_segment_counts_never_match() {
    for template in TEMPLATES {
        let pattern = Pattern::compile(template).unwrap();
        let path = concrete(template, &["1", "2", "3"]);

        let longer = format!("{path}/extra");
        assert!(pattern.matches(&longer).is_none(), "{longer}");

        let shorter = path.rsplit_once('/').map(|(head, _)| head.to_string()).unwrap();
        assert!(pattern.matches(&shorter).is_none(), "{shorter}");
    }
}

#[test]
fn router_resolves_each_registered_template() {
    let mut router = Router::new();
    for (i, template) in TEMPLATES.iter().enumerate() {
        router.add(Method::GET, template, i).unwrap();
    }
    for (i, template) in TEMPLATES.iter().enumerate() {
        let path = concrete(template, &["1", "2", "3"]);
        let (hit, _) = router.resolve(&Method::GET, &path).unwrap();
        assert_eq!(*hit, i, "{path}");
    }
}
