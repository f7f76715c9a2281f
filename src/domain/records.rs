//! 账户数据库文本解析
//!
//! 支持三种格式：
//! - `/etc/passwd` 冒号分隔行（至少 7 列）
//! - `/etc/group` 冒号分隔行（至少 4 列，第 4 列为逗号分隔的成员）
//! - `Get-LocalGroup` 表格输出（空白分隔，至少 4 列，无成员列）
//!
//! 列数不足的行直接跳过，不视为错误

use std::collections::BTreeMap;

use super::account::{GroupRecord, UserRecord};

/// passwd 行最少列数
const PASSWD_MIN_FIELDS: usize = 7;
/// group 行最少列数
const GROUP_MIN_FIELDS: usize = 4;
/// 表格形式组列表最少列数
const LISTING_MIN_TOKENS: usize = 4;
/// Windows 用户列表 (`Name|SID|FullName`) 最少列数
const USER_LISTING_MIN_FIELDS: usize = 3;
/// Select-Object 表格输出的表头行数（列名 + 分隔线）
const LISTING_HEADER_LINES: usize = 2;

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// 解析一行 passwd 记录
pub fn parse_passwd_line(line: &str) -> Option<UserRecord> {
    let line = line.trim_end_matches(['\r', '\n']);
    if is_comment(line) {
        return None;
    }

    let parts: Vec<&str> = line.split(':').collect();
    if parts.len() < PASSWD_MIN_FIELDS || parts[0].is_empty() {
        return None;
    }

    Some(UserRecord {
        username: parts[0].to_string(),
        uid: parts[2].to_string(),
        gid: parts[3].to_string(),
        full_name: parts[4].to_string(),
        home_dir: parts[5].to_string(),
        shell: parts[6].trim().to_string(),
        is_logged_in: false,
    })
}

/// 解析 `Name|SID|FullName` 形式的 Windows 用户行
pub fn parse_user_listing_line(line: &str) -> Option<UserRecord> {
    let parts: Vec<&str> = line.trim().split('|').collect();
    if parts.len() < USER_LISTING_MIN_FIELDS || parts[0].is_empty() {
        return None;
    }

    Some(UserRecord {
        username: parts[0].to_string(),
        uid: parts[1].to_string(),
        gid: String::new(),
        full_name: parts[2].to_string(),
        home_dir: String::new(),
        shell: String::new(),
        is_logged_in: false,
    })
}

/// 将逗号分隔的成员字段拆成用户名列表
///
/// 空字段得到空列表，而不是包含一个空字符串的列表
pub fn parse_member_field(field: &str) -> Vec<String> {
    field
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

/// 解析一行 group 记录
pub fn parse_group_line(line: &str) -> Option<GroupRecord> {
    let line = line.trim_end_matches(['\r', '\n']);
    if is_comment(line) {
        return None;
    }

    let parts: Vec<&str> = line.split(':').collect();
    if parts.len() < GROUP_MIN_FIELDS || parts[0].is_empty() {
        return None;
    }

    Some(GroupRecord::Posix {
        name: parts[0].to_string(),
        gid: parts[2].to_string(),
        members: parse_member_field(parts[3]),
    })
}

/// 解析一行表格形式的组列表
///
/// 恰好 4 个 token 时按位置对应 名称 / 描述 / 类别 / SID。
/// 超过 4 个 token 时不再按位置取前四个：第一个为组名，最后两个为类别与 SID，
/// 中间全部拼回描述，因为只有描述列会包含空白
pub fn parse_group_listing_line(line: &str) -> Option<GroupRecord> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < LISTING_MIN_TOKENS {
        return None;
    }

    let last = tokens.len() - 1;
    Some(GroupRecord::Listing {
        name: tokens[0].to_string(),
        description: tokens[1..last - 1].join(" "),
        category: tokens[last - 1].to_string(),
        sid: tokens[last].to_string(),
        members: None,
    })
}

/// 解析完整 passwd 文档，重复用户名以最后一行为准
pub fn parse_passwd(output: &str) -> BTreeMap<String, UserRecord> {
    output
        .lines()
        .filter_map(parse_passwd_line)
        .map(|user| (user.username.clone(), user))
        .collect()
}

/// 解析 Windows 用户列表
pub fn parse_user_listing(output: &str) -> BTreeMap<String, UserRecord> {
    output
        .lines()
        .filter_map(parse_user_listing_line)
        .map(|user| (user.username.clone(), user))
        .collect()
}

/// 解析完整 group 文档，重复组名以最后一行为准
pub fn parse_group_db(output: &str) -> BTreeMap<String, GroupRecord> {
    output
        .lines()
        .filter_map(parse_group_line)
        .map(|group| (group.name().to_string(), group))
        .collect()
}

/// 解析 `Get-LocalGroup | Select-Object ...` 表格输出（跳过表头）
pub fn parse_group_listing(output: &str) -> BTreeMap<String, GroupRecord> {
    output
        .trim()
        .lines()
        .skip(LISTING_HEADER_LINES)
        .filter_map(parse_group_listing_line)
        .map(|group| (group.name().to_string(), group))
        .collect()
}

/// 解析每行一个成员名的输出（Get-LocalGroupMember）
pub fn parse_member_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_passwd_two_lines() {
        let output = "alice:x:1001:1001:Alice A:/home/alice:/bin/bash\nbroken-line\n";
        let users = parse_passwd(output);

        assert_eq!(users.len(), 1);
        let alice = &users["alice"];
        assert_eq!(alice.uid, "1001");
        assert_eq!(alice.gid, "1001");
        assert_eq!(alice.full_name, "Alice A");
        assert_eq!(alice.home_dir, "/home/alice");
        assert_eq!(alice.shell, "/bin/bash");
    }

    #[test]
    fn test_parse_passwd_skips_malformed_and_comments() {
        let output = "\
# managed by ansible
root:x:0:0:root:/root:/bin/bash
short:x:1
:x:5:5::/:/bin/sh

daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin";
        let users = parse_passwd(output);
        assert_eq!(users.keys().collect::<Vec<_>>(), vec!["daemon", "root"]);
    }

    #[test]
    fn test_parse_passwd_last_line_wins() {
        let output = "bob:x:1002:1002:Old:/home/bob:/bin/sh\nbob:x:1002:1002:New:/srv/bob:/bin/zsh";
        let users = parse_passwd(output);
        assert_eq!(users.len(), 1);
        assert_eq!(users["bob"].full_name, "New");
        assert_eq!(users["bob"].shell, "/bin/zsh");
    }

    #[test]
    fn test_parse_passwd_crlf() {
        let user = parse_passwd_line("carol:x:1003:1003::/home/carol:/bin/bash\r").unwrap();
        assert_eq!(user.shell, "/bin/bash");
    }

    #[test]
    fn test_empty_member_field_is_empty_list() {
        assert!(parse_member_field("").is_empty());
        assert_eq!(parse_member_field("alice,bob"), vec!["alice", "bob"]);
        assert_eq!(parse_member_field("alice,,bob,"), vec!["alice", "bob"]);
    }

    #[test]
    fn test_parse_group_db() {
        let output = "root:x:0:\ndevs:x:2000:alice,bob\nbad:x\n";
        let groups = parse_group_db(output);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups["root"].members(), Some(&[][..]));
        match &groups["devs"] {
            GroupRecord::Posix { gid, members, .. } => {
                assert_eq!(gid, "2000");
                assert_eq!(members, &vec!["alice".to_string(), "bob".to_string()]);
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_parse_group_listing_skips_header() {
        let output = "\
Name           Description GroupCategory SID
----           ----------- ------------- ---
Administrators Admins      Security      S-1-5-32-544
Users          Users       Security      S-1-5-32-545
Short          only
";
        let groups = parse_group_listing(output);
        assert_eq!(groups.len(), 2);
        match &groups["Administrators"] {
            GroupRecord::Listing {
                description,
                category,
                sid,
                members,
                ..
            } => {
                assert_eq!(description, "Admins");
                assert_eq!(category, "Security");
                assert_eq!(sid, "S-1-5-32-544");
                assert!(members.is_none());
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_parse_group_listing_multi_word_description() {
        let group =
            parse_group_listing_line("Guests Guests have limited access Security S-1-5-32-546")
                .unwrap();
        match group {
            GroupRecord::Listing {
                description, sid, ..
            } => {
                assert_eq!(description, "Guests have limited access");
                assert_eq!(sid, "S-1-5-32-546");
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_parse_user_listing() {
        let users = parse_user_listing("Administrator|S-1-5-21-1-500|\nalice|S-1-5-21-1-1001|Alice A\nbogus\n");
        assert_eq!(users.len(), 2);
        assert_eq!(users["alice"].uid, "S-1-5-21-1-1001");
        assert_eq!(users["alice"].full_name, "Alice A");
    }

    #[test]
    fn test_parse_member_lines() {
        assert_eq!(
            parse_member_lines("HOST\\alice\r\n\r\nHOST\\bob\r\n"),
            vec!["HOST\\alice", "HOST\\bob"]
        );
        assert!(parse_member_lines("").is_empty());
    }
}
