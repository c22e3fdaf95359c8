//! # 终端命令提示
//!
//! 固定的常用命令目录（shell、PHP、Composer、Laravel Artisan、CodeIgniter Spark、
//! Git、npm、yarn），终端输入时按子串匹配给出补全建议。

use crate::models::app::CommandHint;

/// 单次最多返回的建议条数
pub const MAX_SUGGESTIONS: usize = 5;

const fn hint(command: &'static str, description: &'static str) -> CommandHint {
    CommandHint {
        command,
        description,
    }
}

/// 命令目录（按分组排列，匹配结果保持此顺序）
const CATALOGUE: &[CommandHint] = &[
    // shell
    hint("cd", "切换当前目录"),
    hint("mkdir", "新建目录"),
    hint("rmdir", "删除空目录"),
    hint("rm", "删除文件或目录"),
    hint("dir", "列出文件和文件夹（Windows）"),
    hint("ls", "列出文件和文件夹（Linux/Mac）"),
    hint("cls", "清屏（Windows）"),
    hint("clear", "清屏（Linux/Mac）"),
    // PHP
    hint("php -v", "显示 PHP 版本"),
    hint("php -m", "列出已安装的 PHP 模块"),
    hint("php -S localhost:8000", "启动 PHP 内置服务器"),
    hint("php file.php", "执行 PHP 脚本"),
    // Composer
    hint("composer install", "安装项目依赖"),
    hint("composer update", "更新项目依赖"),
    hint("composer require", "添加依赖包"),
    hint("composer remove", "移除依赖包"),
    hint("composer dump-autoload", "重新生成自动加载文件"),
    hint("composer create-project", "创建新项目"),
    hint("composer validate", "校验 composer.json"),
    hint("composer show", "显示依赖包信息"),
    // Laravel Artisan
    hint("php artisan optimize", "优化应用性能"),
    hint("php artisan optimize:clear", "清除优化缓存"),
    hint("php artisan config:cache", "缓存配置"),
    hint("php artisan route:cache", "缓存路由"),
    hint("php artisan view:cache", "预编译所有 Blade 视图"),
    hint("php artisan event:cache", "缓存事件和监听器"),
    hint("php artisan make:request", "新建表单请求类"),
    hint("php artisan make:middleware", "新建中间件"),
    hint("php artisan make:job", "新建队列任务"),
    hint("php artisan make:event", "新建事件"),
    hint("php artisan make:listener", "新建监听器"),
    hint("php artisan make:command", "新建 Artisan 命令"),
    hint("php artisan schedule:run", "执行计划任务"),
    hint("php artisan queue:work", "处理队列任务"),
    hint("php artisan queue:restart", "重启队列进程"),
    hint("php artisan down", "进入维护模式"),
    hint("php artisan up", "退出维护模式"),
    // CodeIgniter Spark
    hint("php spark serve", "启动开发服务器"),
    hint("php spark migrate", "执行数据库迁移"),
    hint("php spark migrate:rollback", "回滚上一次迁移"),
    hint("php spark make:controller", "新建控制器"),
    hint("php spark make:model", "新建模型"),
    hint("php spark make:migration", "新建迁移"),
    hint("php spark make:seeder", "新建数据填充类"),
    hint("php spark db:seed", "执行数据填充"),
    hint("php spark cache:clear", "清除应用缓存"),
    hint("php spark routes", "列出所有已注册路由"),
    // Git
    hint("git init", "初始化 Git 仓库"),
    hint("git clone", "克隆 Git 仓库"),
    hint("git add", "添加文件到暂存区"),
    hint("git commit -m", "创建提交"),
    hint("git push", "推送提交到远程仓库"),
    hint("git pull", "拉取并合并远程变更"),
    hint("git status", "查看仓库状态"),
    hint("git branch", "列出、创建或删除分支"),
    hint("git checkout", "切换分支或提交"),
    // npm / yarn
    hint("npm install", "安装依赖"),
    hint("npm update", "更新依赖"),
    hint("npm run", "执行 package.json 中定义的脚本"),
    hint("npm run dev", "执行开发脚本"),
    hint("npm run build", "执行生产构建脚本"),
    hint("yarn install", "安装依赖（Yarn）"),
    hint("yarn run", "使用 Yarn 执行脚本"),
];

/// 完整命令目录
pub fn catalogue() -> &'static [CommandHint] {
    CATALOGUE
}

/// 根据输入给出命令建议
///
/// 输入去除首尾空白并转为小写后，返回命令中包含该子串的条目，
/// 保持目录顺序，最多 `MAX_SUGGESTIONS` 条。空输入不返回任何建议。
pub fn suggest(input: &str) -> Vec<CommandHint> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    CATALOGUE
        .iter()
        .filter(|hint| hint.command.to_lowercase().contains(&needle))
        .take(MAX_SUGGESTIONS)
        .cloned()
        .collect()
}
